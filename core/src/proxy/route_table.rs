//! Model routing table
//! Maps client-facing model ids to Azure deployment names

/// Immutable model id -> deployment table.
///
/// Entries keep their insertion order so `/v1/models` lists them the way they
/// were configured. A model mapped to an empty deployment stays listed but
/// never resolves.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(String, String)>,
}

impl RouteTable {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut table: Vec<(String, String)> = Vec::new();
        for (model, deployment) in entries {
            // Re-assigning a model keeps its original position
            match table.iter_mut().find(|(m, _)| *m == model) {
                Some(existing) => existing.1 = deployment,
                None => table.push((model, deployment)),
            }
        }
        Self { entries: table }
    }

    /// Resolve a model id to its deployment, `None` if absent or unconfigured
    pub fn resolve(&self, model: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == model)
            .map(|(_, deployment)| deployment.as_str())
            .filter(|deployment| !deployment.is_empty())
    }

    /// Model ids in configuration order
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(m, _)| m.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(m, d)| (m.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
