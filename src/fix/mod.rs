// mysql-backup/src/fix/mod.rs
pub(crate) mod logic;

pub use logic::FixOptions;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::utils::prompt::Prompt;
use logic::FixFilePipeline;

/// Public entry point for the file encoding fix.
pub async fn run_fix_flow(app_config: &AppConfig, options: &FixOptions, prompt: &dyn Prompt) -> Result<()> {
    let location = if options.from_cloud {
        app_config.cloud_location().await?
    } else {
        app_config.local_location()
    };

    FixFilePipeline { prompt, location }.run(options).await?;
    Ok(())
}
