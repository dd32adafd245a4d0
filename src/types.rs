use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An entity served by a paginated read endpoint.
///
/// The listing core treats records as opaque payload; it only needs the
/// stable id for keying and the name of the wrapper field some endpoints
/// nest their arrays under.
pub trait Record: DeserializeOwned + Clone + Send + 'static {
    /// Wrapper field consulted after the top-level array and `data` shapes.
    const WRAPPER: &'static str;

    fn id(&self) -> u64;
}

/// Lab test offered by the clinic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTest {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for LabTest {
    const WRAPPER: &'static str = "tests";

    fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for LabTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.name, code),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Branch where tests are priced individually
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
}

impl Record for Branch {
    const WRAPPER: &'static str = "branches";

    fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.city {
            Some(city) => write!(f, "{} - {}", self.name, city),
            None => write!(f, "{}", self.name),
        }
    }
}
