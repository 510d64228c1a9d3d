//! Interning of supplementary-module script names into small integer ids.

/// Sorted, de-duplicated list of every known script name. The empty name
/// always sits at id 0, which doubles as "no script".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNames {
    names: Vec<String>,
}

impl Default for ScriptNames {
    fn default() -> Self {
        Self {
            names: vec![String::new()],
        }
    }
}

impl ScriptNames {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all: Vec<String> = names.into_iter().map(Into::into).collect();
        all.push(String::new());
        all.sort();
        all.dedup();
        Self { names: all }
    }

    /// Binary search for `name`; 0 when unknown.
    pub fn script_id(&self, name: &str) -> u32 {
        self.names
            .binary_search_by(|probe| probe.as_str().cmp(name))
            .map(|index| index as u32)
            .unwrap_or(0)
    }

    pub fn script_name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Number of ids, including the empty name.
    pub fn script_ids_count(&self) -> u32 {
        self.names.len() as u32
    }
}
