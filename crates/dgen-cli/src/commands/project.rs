use anyhow::Result;

use super::with_status;
use crate::bootstrap::AppBootstrap;

pub async fn create(app: &AppBootstrap, account: &str, name: &str) -> Result<()> {
    let project = app
        .project_service()
        .create_project(account, name)
        .await
        .map_err(with_status)?;
    println!("{}", project.id);
    Ok(())
}

pub async fn list(app: &AppBootstrap, account: &str) -> Result<()> {
    let projects = app
        .project_service()
        .list_projects(account)
        .await
        .map_err(with_status)?;
    for project in projects {
        println!(
            "{}\t{}\t{} entries\tupdated {}",
            project.id,
            project.name,
            project.history.len(),
            project.updated_at.to_rfc3339()
        );
    }
    Ok(())
}

pub async fn history(app: &AppBootstrap, account: &str, project_id: &str) -> Result<()> {
    let entries = app
        .project_service()
        .history(account, project_id)
        .await
        .map_err(with_status)?;
    for entry in entries {
        println!(
            "{} {:?} {}",
            entry.updated_at.to_rfc3339(),
            entry.update_type,
            entry.prompt
        );
        for line in entry.diagram.lines() {
            println!("    {}", line);
        }
    }
    Ok(())
}

pub async fn records(app: &AppBootstrap, account: &str, project_id: &str) -> Result<()> {
    let records = app
        .project_service()
        .records(account, project_id)
        .await
        .map_err(with_status)?;
    for record in records {
        println!(
            "{}\t{}\t{}",
            record.id,
            record.created_at.to_rfc3339(),
            record.prompt
        );
    }
    Ok(())
}

pub async fn delete(app: &AppBootstrap, account: &str, project_id: &str) -> Result<()> {
    app.project_service()
        .delete_project(account, project_id)
        .await
        .map_err(with_status)?;
    println!("Deleted project {}", project_id);
    Ok(())
}
