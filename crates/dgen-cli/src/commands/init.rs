use anyhow::Result;

use crate::bootstrap::AppBootstrap;

pub fn run(app: &AppBootstrap) -> Result<()> {
    app.config_service.ensure_config_file()?;
    let secret_file = app.secret_service()?.ensure_secret_file()?;

    println!("Config:  {}", app.paths.config_file()?.display());
    println!("Secrets: {}", secret_file.display());
    println!("Data:    {}", app.paths.data_dir()?.display());
    Ok(())
}
