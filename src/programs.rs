use crate::parser::parse;
use crate::types::{Machine, TilerError, DEFAULT_BOUNDARY_SYMBOL};

// Built-in machine descriptions
const MACHINE_TEXTS: [&str; 4] = [
    include_str!("../machines/halt-immediately.tm"),
    include_str!("../machines/binary-increment.tm"),
    include_str!("../machines/bit-flip.tm"),
    include_str!("../machines/busy-beaver-2.tm"),
];

/// A built-in machine together with the description it was parsed from.
#[derive(Debug, Clone)]
pub struct BuiltinMachine {
    pub text: &'static str,
    pub machine: Machine,
}

lazy_static::lazy_static! {
    /// The built-in machines, parsed with the default boundary symbol.
    pub static ref MACHINES: Vec<BuiltinMachine> = MACHINE_TEXTS
        .iter()
        .filter_map(|text| match parse(text, DEFAULT_BOUNDARY_SYMBOL) {
            Ok(machine) => Some(BuiltinMachine { text, machine }),
            Err(e) => {
                tracing::error!("failed to parse built-in machine: {e}");
                None
            }
        })
        .collect();
}

pub struct MachineCatalog;

impl MachineCatalog {
    /// Get the number of built-in machines
    pub fn count() -> usize {
        MACHINES.len()
    }

    /// Get a machine by its index
    pub fn get_machine_by_index(index: usize) -> Result<Machine, TilerError> {
        MACHINES.get(index).map(|builtin| builtin.machine.clone()).ok_or_else(|| {
            TilerError::ValidationError(format!("Machine index {} out of range", index))
        })
    }

    /// Get a machine by its name
    pub fn get_machine_by_name(name: &str) -> Result<Machine, TilerError> {
        Self::find(name)
            .map(|builtin| builtin.machine.clone())
            .ok_or_else(|| TilerError::ValidationError(format!("Machine '{}' not found", name)))
    }

    /// Get the description of a machine by its name, e.g. to parse it with another
    /// boundary symbol
    pub fn get_machine_text_by_name(name: &str) -> Result<&'static str, TilerError> {
        Self::find(name)
            .map(|builtin| builtin.text)
            .ok_or_else(|| TilerError::ValidationError(format!("Machine '{}' not found", name)))
    }

    /// List all machine names
    pub fn list_machine_names() -> Vec<String> {
        MACHINES
            .iter()
            .map(|builtin| builtin.machine.name.clone())
            .collect()
    }

    fn find(name: &str) -> Option<&'static BuiltinMachine> {
        MACHINES.iter().find(|builtin| builtin.machine.name == name)
    }

    /// Get information about a machine by its index
    pub fn get_machine_info(index: usize) -> Result<MachineInfo, TilerError> {
        let machine = Self::get_machine_by_index(index)?;

        Ok(MachineInfo {
            index,
            name: machine.name.clone(),
            initial_state: machine.initial_state.clone(),
            initial_location: machine.initial_location,
            state_count: machine.states().len(),
            symbol_count: machine.alphabet().count(),
            transition_count: machine.transitions.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MachineInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub initial_location: usize,
    pub state_count: usize,
    pub symbol_count: usize,
    pub transition_count: usize,
}
