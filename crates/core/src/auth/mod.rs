mod allow_list;
mod traits;

pub use allow_list::*;
pub use traits::*;

use crate::config::AccessConfig;

/// Factory function to create authorizer from config
pub fn create_authorizer(config: &AccessConfig) -> Result<Box<dyn Authorizer>, AuthError> {
    if config.authorized_users.is_empty() {
        return Err(AuthError::ConfigurationError(
            "authorized_users must not be empty".to_string(),
        ));
    }
    Ok(Box::new(AllowList::new(
        config.authorized_users.iter().copied(),
    )))
}
