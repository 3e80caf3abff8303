// src/medium/mod.rs - physical constants governing vapor transport and ice growth

pub mod rate_table;

pub use rate_table::{NeighborShell, RateTable, ResolvedRates};

use crate::constants::*;
use crate::error::{Result, SimError};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable bundle of rate constants for one run.
///
/// * `rho` - ambient vapor density given to every free cell at start
/// * `phi` - vertical flow bias in `[-1, 1]`; upward exchange runs at `kappa * (1 + phi)`
/// * `kappa` - vapor mobility per cell face
/// * `mu` - baseline fraction of boundary mass frozen per tick
/// * `beta` - baseline attachment threshold; a boundary cell moves
///   `min(1, 1 / beta)` of its vapor into boundary mass per tick
/// * `kappa_ab` / `mu_ab` / `beta_ab` - overrides indexed by [`NeighborShell`];
///   `kappa_ab` sets the face mobility of boundary cells
///
/// The default `beta_ab` table covers every reachable shell, so writing the
/// `beta` field alone changes nothing. [`with_beta`](Self::with_beta) and a
/// config that names `beta` without `beta_ab` replace the whole table, and
/// `kappa` and `mu` behave the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MediumConfig")]
pub struct Medium {
    pub rho: f64,
    pub phi: f64,
    pub kappa: f64,
    pub mu: f64,
    pub beta: f64,
    pub kappa_ab: RateTable,
    pub mu_ab: RateTable,
    pub beta_ab: RateTable,
}

/// Serialized form of [`Medium`]; absent scalars keep the defaults.
#[derive(Deserialize)]
#[serde(default)]
struct MediumConfig {
    rho: f64,
    phi: f64,
    kappa: Option<f64>,
    mu: Option<f64>,
    beta: Option<f64>,
    kappa_ab: Option<RateTable>,
    mu_ab: Option<RateTable>,
    beta_ab: Option<RateTable>,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self {
            rho: DEFAULT_RHO,
            phi: DEFAULT_PHI,
            kappa: None,
            mu: None,
            beta: None,
            kappa_ab: None,
            mu_ab: None,
            beta_ab: None,
        }
    }
}

impl From<MediumConfig> for Medium {
    fn from(raw: MediumConfig) -> Self {
        let mut medium = Medium::default().with_rho(raw.rho).with_phi(raw.phi);
        if let Some(kappa) = raw.kappa {
            medium = medium.with_kappa(kappa);
        }
        if let Some(mu) = raw.mu {
            medium = medium.with_mu(mu);
        }
        if let Some(beta) = raw.beta {
            medium = medium.with_beta(beta);
        }
        if let Some(table) = raw.kappa_ab {
            medium.kappa_ab = table;
        }
        if let Some(table) = raw.mu_ab {
            medium.mu_ab = table;
        }
        if let Some(table) = raw.beta_ab {
            medium.beta_ab = table;
        }
        medium
    }
}

impl Default for Medium {
    fn default() -> Self {
        Self {
            rho: DEFAULT_RHO,
            phi: DEFAULT_PHI,
            kappa: DEFAULT_KAPPA,
            mu: DEFAULT_MU,
            beta: DEFAULT_BETA,
            kappa_ab: RateTable::new(),
            mu_ab: RateTable::new(),
            beta_ab: RateTable::new()
                .with(NeighborShell::new(0, 1), DEFAULT_BETA_01)
                .with(NeighborShell::new(1, 0), DEFAULT_BETA_10)
                .with(NeighborShell::new(1, 1), DEFAULT_BETA_11)
                .with(NeighborShell::new(2, 0), DEFAULT_BETA_20)
                .with(NeighborShell::new(2, 1), DEFAULT_BETA_21)
                .with(NeighborShell::new(3, 0), DEFAULT_BETA_30)
                .with(NeighborShell::new(3, 1), DEFAULT_BETA_31),
        }
    }
}

impl Medium {
    /// Medium with only baseline rates and no indexed overrides.
    pub fn uniform(rho: f64, kappa: f64, mu: f64, beta: f64) -> Self {
        Self {
            rho,
            phi: 0.0,
            kappa,
            mu,
            beta,
            kappa_ab: RateTable::new(),
            mu_ab: RateTable::new(),
            beta_ab: RateTable::new(),
        }
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_phi(mut self, phi: f64) -> Self {
        self.phi = phi;
        self
    }

    /// Set the mobility of every face and drop the `kappa_ab` overrides.
    pub fn with_kappa(mut self, kappa: f64) -> Self {
        self.kappa = kappa;
        self.kappa_ab.clear();
        self
    }

    /// Set the freezing rate of every shell and drop the `mu_ab` overrides.
    pub fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self.mu_ab.clear();
        self
    }

    /// Set the threshold of every shell and drop the `beta_ab` overrides.
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self.beta_ab.clear();
        self
    }

    pub fn with_kappa_ab(mut self, in_plane: u8, vertical: u8, kappa: f64) -> Self {
        self.kappa_ab.set(NeighborShell::new(in_plane, vertical), kappa);
        self
    }

    pub fn with_mu_ab(mut self, in_plane: u8, vertical: u8, mu: f64) -> Self {
        self.mu_ab.set(NeighborShell::new(in_plane, vertical), mu);
        self
    }

    pub fn with_beta_ab(mut self, in_plane: u8, vertical: u8, beta: f64) -> Self {
        self.beta_ab.set(NeighborShell::new(in_plane, vertical), beta);
        self
    }

    /// Named media reproducing the reference runs.
    pub fn preset(name: &str) -> Option<Medium> {
        MEDIUM_PRESETS.get(name).cloned()
    }

    /// Face mobility of a boundary cell with this shell.
    pub fn mobility(&self, shell: NeighborShell) -> f64 {
        self.kappa_ab.lookup(shell, self.kappa)
    }

    pub fn freezing_rate(&self, shell: NeighborShell) -> f64 {
        self.mu_ab.lookup(shell, self.mu)
    }

    pub fn attachment_threshold(&self, shell: NeighborShell) -> f64 {
        self.beta_ab.lookup(shell, self.beta)
    }

    /// Fraction of diffusive mass a boundary cell attaches per tick.
    pub fn attachment_fraction(&self, shell: NeighborShell) -> f64 {
        threshold_to_fraction(self.attachment_threshold(shell))
    }

    /// Largest mobility any free cell can have.
    pub fn max_kappa(&self) -> f64 {
        self.kappa_ab.iter().map(|(_, kappa)| kappa).fold(self.kappa, f64::max)
    }

    /// Largest total outflow rate of any free cell (6 in-plane faces plus the vertical pair).
    pub fn max_outflow_rate(&self) -> f64 {
        let kappa = self.max_kappa();
        6.0 * kappa + kappa * (1.0 + self.phi) + kappa * (1.0 - self.phi)
    }

    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("rho", self.rho),
            ("phi", self.phi),
            ("kappa", self.kappa),
            ("mu", self.mu),
            ("beta", self.beta),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(SimError::validation(format!("{} must be finite, got {}", name, value)));
            }
        }
        if self.rho < 0.0 {
            return Err(SimError::validation(format!("rho must be non-negative, got {}", self.rho)));
        }
        if self.kappa < 0.0 {
            return Err(SimError::validation(format!("kappa must be non-negative, got {}", self.kappa)));
        }
        if !(-1.0..=1.0).contains(&self.phi) {
            return Err(SimError::validation(format!("phi must lie in [-1, 1], got {}", self.phi)));
        }
        if !(0.0..=1.0).contains(&self.mu) {
            return Err(SimError::validation(format!("mu must lie in [0, 1], got {}", self.mu)));
        }
        if self.beta < 0.0 {
            return Err(SimError::validation(format!("beta must be non-negative, got {}", self.beta)));
        }
        self.kappa_ab.validate("kappa", |kappa| kappa >= 0.0)?;
        self.mu_ab.validate("mu", |mu| (0.0..=1.0).contains(&mu))?;
        self.beta_ab.validate("beta", |beta| beta >= 0.0)?;
        Ok(())
    }

    pub(crate) fn resolved_attachment(&self) -> ResolvedRates {
        self.beta_ab
            .resolve(self.beta, |beta| threshold_to_fraction(beta) as f32)
    }

    pub(crate) fn resolved_mobility(&self) -> ResolvedRates {
        self.kappa_ab.resolve(self.kappa, |kappa| kappa as f32)
    }

    pub(crate) fn resolved_freezing(&self) -> ResolvedRates {
        self.mu_ab.resolve(self.mu, |mu| mu as f32)
    }
}

fn threshold_to_fraction(beta: f64) -> f64 {
    if beta <= 1.0 { 1.0 } else { 1.0 / beta }
}

pub static MEDIUM_PRESETS: Lazy<HashMap<&'static str, Medium>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("canonical", Medium::default());

    m.insert(
        "snowflake1",
        Medium::default()
            .with_rho(0.1)
            .with_phi(0.0)
            .with_kappa(0.1)
            .with_mu(0.001)
            .with_beta_ab(0, 1, 2.5)
            .with_beta_ab(1, 0, 2.0)
            .with_beta_ab(1, 1, 2.0)
            .with_beta_ab(2, 0, 2.0)
            .with_beta_ab(2, 1, 1.0)
            .with_beta_ab(3, 0, 1.0)
            .with_beta_ab(3, 1, 1.0),
    );

    m.insert(
        "snowflake8",
        Medium::default()
            .with_rho(0.14)
            .with_phi(0.0)
            .with_kappa(0.1)
            .with_mu(0.001)
            .with_mu_ab(0, 1, 0.002)
            .with_mu_ab(1, 0, 0.003)
            .with_mu_ab(2, 0, 0.003)
            .with_beta_ab(0, 1, 3.0)
            .with_beta_ab(1, 0, 1.4)
            .with_beta_ab(1, 1, 1.4)
            .with_beta_ab(2, 0, 1.4)
            .with_beta_ab(2, 1, 1.0)
            .with_beta_ab(3, 0, 1.0)
            .with_beta_ab(3, 1, 1.0),
    );

    m
});
