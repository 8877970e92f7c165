// ============================================================
// Layer 4 — Layout Programs
// ============================================================
// Some datasets supervise a module-network layout: a short
// program of module names such as
//
//   _Find _Filter _Filter _Describe
//
// Two pieces live here:
//   - prune_filter_modules: collapses redundant _Filter steps
//   - ModuleAssembler: maps module names to ids and pads the
//     program with <eos> to a fixed decoder length

use std::path::Path;

use crate::data::vocab::VocabularyIndex;
use crate::domain::traits::LayoutAssembler;
use crate::error::{Result, VqaError};

pub const EOS_TOKEN: &str = "<eos>";

/// Drop every `_Filter` that directly follows `_Filter` or `_Find`.
/// Predecessors are judged on the original program.
pub fn prune_filter_modules(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .enumerate()
        .filter(|&(n, token)| {
            let redundant = n > 0
                && token == "_Filter"
                && matches!(tokens[n - 1].as_str(), "_Filter" | "_Find");
            !redundant
        })
        .map(|(_, token)| token.clone())
        .collect()
}

/// Layout assembler backed by a module vocabulary file.
#[derive(Debug, Clone)]
pub struct ModuleAssembler {
    modules: VocabularyIndex,
    eos_id: usize,
}

impl ModuleAssembler {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(VocabularyIndex::from_file(path)?)
    }

    pub fn new(modules: VocabularyIndex) -> Result<Self> {
        let eos_id = modules.id_of(EOS_TOKEN);
        if eos_id == modules.unknown_id() {
            return Err(VqaError::format("module vocabulary has no <eos> entry"));
        }
        Ok(Self { modules, eos_id })
    }
}

impl LayoutAssembler for ModuleAssembler {
    fn module_list_to_tokens(&self, modules: &[String], length: usize) -> Result<Vec<i32>> {
        // At least one <eos> must fit after the program.
        if modules.len() >= length {
            return Err(VqaError::format(format!(
                "layout of {} modules does not fit {length} decoder steps",
                modules.len()
            )));
        }

        let mut ids = Vec::with_capacity(length);
        for name in modules {
            let id = self.modules.id_of(name);
            if id == self.modules.unknown_id() {
                return Err(VqaError::format(format!("unknown layout module '{name}'")));
            }
            ids.push(id as i32);
        }
        ids.resize(length, self.eos_id as i32);
        Ok(ids)
    }
}
