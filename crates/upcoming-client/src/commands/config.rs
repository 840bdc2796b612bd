//! Configuration commands.

use crate::config::AppConfig;
use crate::error::ClientResult;

/// Show the configuration directory and the files read from it.
pub fn path(config: &AppConfig) -> ClientResult<()> {
    print!("{}", describe_paths(config));
    Ok(())
}

fn describe_paths(config: &AppConfig) -> String {
    format!(
        "config dir:  {}\ncredentials: {}\ntoken:       {}\nconfig file: {}\n",
        config.config_dir.display(),
        config.credentials_path().display(),
        config.token_path().display(),
        config.config_file_path().display(),
    )
}
