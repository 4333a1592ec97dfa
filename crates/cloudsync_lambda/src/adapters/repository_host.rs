use crate::error::CreateError;

pub trait RepositoryHost {
    fn create_repository(&self, name: &str, description: &str) -> Result<(), CreateError>;
}

pub fn repository_description(source_url: &str) -> String {
    format!("Sync'd from {source_url}")
}
