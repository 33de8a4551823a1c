use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TsuyakuError};

/// External converter invocation
#[derive(Debug, Clone)]
pub struct ConverterCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl ConverterCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Run to completion; a non-zero exit carries stderr into the error
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing converter command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TsuyakuError::Conversion(format!(
                "Failed to execute {}: {}", self.binary_path, e
            )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TsuyakuError::Conversion(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        debug!("{} completed", self.description);
        Ok(())
    }
}
