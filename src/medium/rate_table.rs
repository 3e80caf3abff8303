use crate::constants::{IN_PLANE_NEIGHBORS, VERTICAL_NEIGHBORS};
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const IN_PLANE_STATES: usize = IN_PLANE_NEIGHBORS + 1;
const VERTICAL_STATES: usize = VERTICAL_NEIGHBORS + 1;

/// Ice-neighbor counts of a free cell: `a` over the in-plane ring, `b` over the vertical pair.
///
/// Written `"ab"` in configuration files, e.g. `"01"` is no in-plane and one
/// vertical ice neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NeighborShell {
    pub in_plane: u8,
    pub vertical: u8,
}

impl NeighborShell {
    pub const fn new(in_plane: u8, vertical: u8) -> Self {
        Self { in_plane, vertical }
    }

    /// A shell is a valid key when it fits the lattice and touches ice at all.
    pub fn is_valid(&self) -> bool {
        (self.in_plane as usize) <= IN_PLANE_NEIGHBORS
            && (self.vertical as usize) <= VERTICAL_NEIGHBORS
            && (self.in_plane, self.vertical) != (0, 0)
    }

    #[inline]
    pub(crate) fn dense_index(&self) -> usize {
        self.in_plane as usize * VERTICAL_STATES + self.vertical as usize
    }
}

impl fmt::Display for NeighborShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.in_plane, self.vertical)
    }
}

impl TryFrom<&str> for NeighborShell {
    type Error = SimError;

    fn try_from(key: &str) -> Result<Self> {
        let digits: Vec<u8> = key
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| SimError::validation(format!("rate key '{}' is not numeric", key)))?;
        if digits.len() != 2 {
            return Err(SimError::validation(format!(
                "rate key '{}' must have exactly two digits",
                key
            )));
        }
        let shell = NeighborShell::new(digits[0], digits[1]);
        if !shell.is_valid() {
            return Err(SimError::validation(format!(
                "rate key '{}' is not a reachable neighbor shell",
                key
            )));
        }
        Ok(shell)
    }
}

/// Sparse `(a, b) -> rate` overrides with a documented fallback.
///
/// Lookup order for a shell `(a, b)`:
/// 1. the exact key;
/// 2. the nearest dominated key, scanning `a' = a..=0` then `b' = b..=0`
///    (both descending);
/// 3. the caller's baseline rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct RateTable {
    rates: BTreeMap<NeighborShell, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, shell: NeighborShell, rate: f64) -> Self {
        self.set(shell, rate);
        self
    }

    pub fn set(&mut self, shell: NeighborShell, rate: f64) {
        self.rates.insert(shell, rate);
    }

    pub fn get(&self, shell: NeighborShell) -> Option<f64> {
        self.rates.get(&shell).copied()
    }

    pub fn clear(&mut self) {
        self.rates.clear();
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NeighborShell, f64)> + '_ {
        self.rates.iter().map(|(shell, rate)| (*shell, *rate))
    }

    pub fn lookup(&self, shell: NeighborShell, base: f64) -> f64 {
        for a in (0..=shell.in_plane).rev() {
            for b in (0..=shell.vertical).rev() {
                if let Some(rate) = self.rates.get(&NeighborShell::new(a, b)) {
                    return *rate;
                }
            }
        }
        base
    }

    /// Check every key and apply `check` to every rate; `name` labels errors.
    pub fn validate(&self, name: &str, check: impl Fn(f64) -> bool) -> Result<()> {
        for (shell, rate) in self.iter() {
            if !shell.is_valid() {
                return Err(SimError::validation(format!(
                    "{}_{} is not a reachable neighbor shell",
                    name, shell
                )));
            }
            if !rate.is_finite() || !check(rate) {
                return Err(SimError::validation(format!(
                    "{}_{} = {} is out of range",
                    name, shell, rate
                )));
            }
        }
        Ok(())
    }

    /// Dense table over every reachable shell, with `map` applied to each looked-up rate.
    pub(crate) fn resolve(&self, base: f64, map: impl Fn(f64) -> f32) -> ResolvedRates {
        let mut table = [0.0f32; IN_PLANE_STATES * VERTICAL_STATES];
        for a in 0..IN_PLANE_STATES as u8 {
            for b in 0..VERTICAL_STATES as u8 {
                let shell = NeighborShell::new(a, b);
                table[shell.dense_index()] = map(self.lookup(shell, base));
            }
        }
        ResolvedRates { table }
    }
}

impl TryFrom<BTreeMap<String, f64>> for RateTable {
    type Error = SimError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self> {
        let mut table = RateTable::new();
        for (key, rate) in raw {
            table.set(NeighborShell::try_from(key.as_str())?, rate);
        }
        Ok(table)
    }
}

impl From<RateTable> for BTreeMap<String, f64> {
    fn from(table: RateTable) -> Self {
        table
            .rates
            .into_iter()
            .map(|(shell, rate)| (shell.to_string(), rate))
            .collect()
    }
}

/// Rates for every shell, precomputed once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRates {
    table: [f32; IN_PLANE_STATES * VERTICAL_STATES],
}

impl ResolvedRates {
    #[inline]
    pub fn get(&self, shell: NeighborShell) -> f32 {
        self.table[shell.dense_index()]
    }

    #[inline]
    pub(crate) fn by_dense_index(&self, idx: usize) -> f32 {
        self.table[idx]
    }
}
