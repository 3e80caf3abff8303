use thiserror::Error;

/// Which per-cell quantity tripped the instability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassQuantity {
    Diffusive,
    Boundary,
    Crystal,
}

impl std::fmt::Display for MassQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MassQuantity::Diffusive => "diffusive mass",
            MassQuantity::Boundary => "boundary mass",
            MassQuantity::Crystal => "crystal mass",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid parameters: {0}")]
    Validation(String),

    #[error("voxel ({x}, {y}, {z}) is outside the {nx}x{ny}x{nz} grid")]
    Bounds {
        x: i64,
        y: i64,
        z: i64,
        nx: usize,
        ny: usize,
        nz: usize,
    },

    #[error("numerical instability at tick {tick}: {quantity} = {value} at ({x}, {y}, {z})")]
    NumericalInstability {
        tick: u64,
        x: usize,
        y: usize,
        z: usize,
        quantity: MassQuantity,
        value: f32,
    },

    #[error("invalid simulation state: {0}")]
    State(String),

    #[error("malformed STL data: {0}")]
    MalformedStl(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SimError::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        SimError::State(msg.into())
    }
}
