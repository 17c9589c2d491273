//! Batch-job script generation for an SGE-style scheduler.
//!
//! One script per (alpha, beta) grid cell, each running a single `stepsim`
//! process, plus `submit_all.sh` listing one `qsub` per script.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::ScriptConfig;
use crate::error::AppError;

pub const SUBMIT_FILE: &str = "submit_all.sh";

/// What `write_scripts` produced.
#[derive(Debug, Clone)]
pub struct ScriptSummary {
    pub scripts: Vec<PathBuf>,
    pub submit_path: PathBuf,
}

/// Render the job script for one (alpha, beta) cell.
pub fn render_script(config: &ScriptConfig, alpha: f64, beta: f64) -> String {
    let log_dir = config.workdir.join(&config.log_dir);
    format!(
        "#!/bin/bash\n\
         #$ -N {alpha}_{beta}\n\
         #$ -e {logs}\n\
         #$ -o {logs}\n\
         {cmd} --alpha {alpha} --beta {beta} --nsims {nsims}\n",
        logs = log_dir.display(),
        cmd = config.sim_command,
        nsims = config.nsims,
    )
}

/// Render the consolidated submission list.
pub fn render_submit_list(scripts: &[PathBuf], submit_delay: u64) -> String {
    let mut out = String::from("#!/bin/bash\n");
    for script in scripts {
        out.push_str(&format!("qsub {}\n", script.display()));
        if submit_delay > 0 {
            out.push_str(&format!("sleep {submit_delay}\n"));
        }
    }
    out
}

/// Write every job script and the submission list.
///
/// The submission list is rewritten from scratch on each call.
pub fn write_scripts(config: &ScriptConfig) -> Result<ScriptSummary, AppError> {
    if config.alphas.is_empty() || config.betas.is_empty() {
        return Err(AppError::input("Script grid must have at least one alpha and one beta."));
    }
    create_dir(&config.script_dir)?;
    create_dir(&config.workdir.join(&config.log_dir))?;

    let mut scripts = Vec::with_capacity(config.alphas.len() * config.betas.len());
    for &alpha in &config.alphas {
        for &beta in &config.betas {
            let path = config.script_dir.join(format!("{alpha}_{beta}.sh"));
            write_file(&path, &render_script(config, alpha, beta))?;
            scripts.push(path);
        }
    }

    let submit_path = config.script_dir.join(SUBMIT_FILE);
    write_file(&submit_path, &render_submit_list(&scripts, config.submit_delay))?;
    info!(
        scripts = scripts.len(),
        submit = %submit_path.display(),
        "wrote job scripts"
    );

    Ok(ScriptSummary { scripts, submit_path })
}

fn create_dir(dir: &Path) -> Result<(), AppError> {
    create_dir_all(dir).map_err(|e| AppError::input(format!("Failed to create directory '{}': {e}", dir.display())))
}

fn write_file(path: &Path, contents: &str) -> Result<(), AppError> {
    let mut file =
        File::create(path).map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))
}
