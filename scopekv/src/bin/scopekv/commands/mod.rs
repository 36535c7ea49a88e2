pub mod check;
pub mod environment;
pub mod organization;

use anyhow::anyhow;
use scopekv::StoreError;

use crate::output::OutputManager;

/// Prints a store failure in user terms and hands it back for the exit code.
pub fn report(output: &OutputManager, err: StoreError) -> anyhow::Error {
    match &err {
        StoreError::PreconditionFailed { kind, name, scope } => {
            output.scope_missing(&format!("cannot write {kind} '{name}': scope does not exist ({scope})"));
        }
        StoreError::AlreadyExists { .. } => {
            output.error(&err.to_string());
            output.info("Use 'update' to replace an existing resource.");
        }
        StoreError::Validation(validation) => {
            for issue in &validation.issues {
                output.error(&format!("{}: {}", issue.field, issue.message));
            }
        }
        _ => output.error(&err.to_string()),
    }
    anyhow!(err)
}
