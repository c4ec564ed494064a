use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("account lookup failed for '{account}': {source}")]
    Account {
        account: String,
        #[source]
        source: std::io::Error,
    },

    #[error("group lookup failed for '{group}': {source}")]
    Group {
        group: String,
        #[source]
        source: std::io::Error,
    },

    #[error("name '{name}' contains an interior NUL byte")]
    InvalidName { name: String },

    #[error("group list for '{account}' needs {requested} entries, over the limit")]
    GroupListTooLarge { account: String, requested: usize },

    #[error("group list for '{account}' still too small after {attempts} attempts")]
    GroupListUnstable { account: String, attempts: usize },
}
