//! This module checks machines and input strings before any tile is generated for them.
//! A machine that fails these checks invalidates every input of a run; an input that fails
//! only affects itself.

use crate::types::{Machine, Move, TilerError, LEFT_SENTINEL, RIGHT_SENTINEL};
use std::collections::HashSet;

/// Represents the problems that make a machine impossible to compile into a tile set.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The machine declares no tape symbols.
    NoSymbols,
    /// The machine declares no transitions.
    NoTransitions,
    /// The boundary symbol is unusable or also declared as a tape symbol.
    InvalidBoundary(String),
    /// Transitions that carry an output but do not halt.
    OutputWithoutHalt(Vec<String>),
    /// Symbols read or written by transitions that are not declared.
    UndeclaredSymbols(Vec<String>),
    /// `(state, symbol)` pairs handled by more than one transition.
    DuplicateTransitions(Vec<String>),
    /// States whose names clash with the horizontal sentinels.
    ReservedStates(Vec<String>),
}

impl From<AnalysisError> for TilerError {
    /// Converts an `AnalysisError` into a `TilerError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        let message = match error {
            AnalysisError::NoSymbols => "No symbols specified".to_string(),
            AnalysisError::NoTransitions => "No transitions specified".to_string(),
            AnalysisError::InvalidBoundary(msg) => format!("Invalid boundary symbol: {msg}"),
            AnalysisError::OutputWithoutHalt(transitions) => format!(
                "Halting output given for non-halting transition: {:?}",
                transitions
            ),
            AnalysisError::UndeclaredSymbols(symbols) => format!(
                "Transitions use symbols that are not declared: {:?}",
                symbols
            ),
            AnalysisError::DuplicateTransitions(pairs) => format!(
                "More than one transition for state and symbol: {:?}",
                pairs
            ),
            AnalysisError::ReservedStates(states) => format!(
                "State names {:?} are reserved for tile sentinels",
                states
            ),
        };
        TilerError::ValidationError(message)
    }
}

/// Analyzes a machine for problems that would make its tile set meaningless.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TilerError::ValidationError)` describing the first problem found.
pub fn analyze(machine: &Machine) -> Result<(), TilerError> {
    let checks: [fn(&Machine) -> Result<(), AnalysisError>; 6] = [
        check_structure,
        check_boundary,
        check_outputs,
        check_symbols,
        check_deterministic,
        check_reserved_states,
    ];

    match checks.iter().find_map(|check| check(machine).err()) {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Checks that an input string can seed an assembly for `machine`.
///
/// Every character must be an alphabet symbol and the head must start inside the input.
pub fn check_input(machine: &Machine, input: &str) -> Result<(), TilerError> {
    let invalid = |reason: String| TilerError::InvalidInput {
        input: input.to_string(),
        reason,
    };

    let mut unknown: Vec<char> = input
        .chars()
        .filter(|c| !machine.is_alphabet_symbol(c.encode_utf8(&mut [0; 4])))
        .collect();

    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(invalid(format!(
            "symbols {:?} are not in the alphabet of {}",
            unknown, machine.name
        )));
    }

    let length = input.chars().count();
    if machine.initial_location >= length {
        return Err(invalid(format!(
            "initial head location {} is outside an input of length {}",
            machine.initial_location, length
        )));
    }

    Ok(())
}

/// Checks that the machine has at least one symbol and one transition.
fn check_structure(machine: &Machine) -> Result<(), AnalysisError> {
    if machine.alphabet().next().is_none() {
        return Err(AnalysisError::NoSymbols);
    }

    if machine.transitions.is_empty() {
        return Err(AnalysisError::NoTransitions);
    }

    Ok(())
}

/// Checks that the boundary symbol is one printable character that cannot be confused
/// with a tape symbol or a comment.
fn check_boundary(machine: &Machine) -> Result<(), AnalysisError> {
    let boundary = machine.boundary_symbol.as_str();
    let mut chars = boundary.chars();

    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() && c != '#' => {}
        _ => {
            return Err(AnalysisError::InvalidBoundary(format!(
                "{boundary:?} must be a single character other than whitespace or '#'"
            )))
        }
    }

    let occurrences = machine.symbols.iter().filter(|s| *s == boundary).count();
    if occurrences != 1 || machine.symbols.last().map(String::as_str) != Some(boundary) {
        return Err(AnalysisError::InvalidBoundary(format!(
            "{boundary:?} must close the symbol list and not be declared as a tape symbol"
        )));
    }

    Ok(())
}

/// Checks that only halting transitions carry an output.
fn check_outputs(machine: &Machine) -> Result<(), AnalysisError> {
    let invalid: Vec<String> = machine
        .transitions
        .iter()
        .filter(|t| t.output.is_some() && t.movement != Move::Halt)
        .map(|t| format!("{} {} -> {}", t.old_state, t.read, t.movement))
        .collect();

    if !invalid.is_empty() {
        return Err(AnalysisError::OutputWithoutHalt(invalid));
    }

    Ok(())
}

/// Checks that transitions only read and write declared symbols or the boundary symbol.
fn check_symbols(machine: &Machine) -> Result<(), AnalysisError> {
    let known: HashSet<&str> = machine.symbols.iter().map(String::as_str).collect();

    let mut undeclared: Vec<String> = machine
        .transitions
        .iter()
        .flat_map(|t| [t.read.as_str(), t.write.as_str()])
        .filter(|symbol| !known.contains(symbol))
        .map(str::to_string)
        .collect();

    if !undeclared.is_empty() {
        undeclared.sort();
        undeclared.dedup();
        return Err(AnalysisError::UndeclaredSymbols(undeclared));
    }

    Ok(())
}

/// Checks that at most one transition handles each `(state, symbol)` pair.
///
/// Transition tiles are looked up by their head signal, so a second transition for the
/// same pair would silently shadow the first.
fn check_deterministic(machine: &Machine) -> Result<(), AnalysisError> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = machine
        .transitions
        .iter()
        .map(|t| t.signal())
        .filter(|signal| !seen.insert(signal.clone()))
        .collect();

    if !duplicates.is_empty() {
        duplicates.sort();
        duplicates.dedup();
        return Err(AnalysisError::DuplicateTransitions(duplicates));
    }

    Ok(())
}

/// Checks that no state is named like a horizontal sentinel.
fn check_reserved_states(machine: &Machine) -> Result<(), AnalysisError> {
    let reserved: Vec<String> = machine
        .states()
        .into_iter()
        .filter(|state| *state == LEFT_SENTINEL || *state == RIGHT_SENTINEL)
        .map(str::to_string)
        .collect();

    if !reserved.is_empty() {
        return Err(AnalysisError::ReservedStates(reserved));
    }

    Ok(())
}
