//! Policy assembly: locate the user's policy sources and compile them.
//!
//! Runs for every event so edits on disk take effect on the next URL.

pub mod bundle;
mod search;

pub use bundle::{CompiledPolicy, ModuleBundle, NAMESPACE};
pub use search::PolicySearch;

use std::fs;
use std::path::PathBuf;

use crate::error::DispatchError;

/// Inputs for one sandbox evaluation.
#[derive(Debug, Default)]
pub struct PolicyConfig {
    pub compiled: Option<CompiledPolicy>,
    pub document_path: Option<PathBuf>,
    /// Raw text of the simple document, not validated here.
    pub document: Option<String>,
}

/// Find and compile the policy. Absence of both sources is `ConfigNotFound`.
pub fn assemble(search: &PolicySearch) -> Result<PolicyConfig, DispatchError> {
    let script = search.find_script();
    let document_path = search.find_document();

    if script.is_none() && document_path.is_none() {
        return Err(DispatchError::ConfigNotFound {
            searched: search.all_paths(),
        });
    }

    if let Some(p) = script {
        tracing::debug!("found config path: {}", p.display());
    }
    if let Some(p) = document_path {
        tracing::debug!("found simple config path: {}", p.display());
    }

    let compiled = script.map(bundle::compile).transpose()?;
    let document = document_path
        .map(|p| {
            fs::read_to_string(p).map_err(|source| DispatchError::ConfigRead {
                path: p.to_path_buf(),
                source,
            })
        })
        .transpose()?;

    Ok(PolicyConfig {
        compiled,
        document_path: document_path.map(|p| p.to_path_buf()),
        document,
    })
}
