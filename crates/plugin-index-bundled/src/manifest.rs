//! JAR manifest parsing.
//!
//! Only the main section is kept. Lines starting with a single space continue
//! the previous attribute's value; attribute names compare case-insensitively.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    pub fn parse(text: &str) -> Self {
        let mut attributes: Vec<(String, String)> = Vec::new();

        for line in text.lines() {
            if line.is_empty() {
                // End of the main section
                break;
            }

            if let Some(rest) = line.strip_prefix(' ') {
                if let Some((_, value)) = attributes.last_mut() {
                    value.push_str(rest);
                }
                continue;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    let value = value.strip_prefix(' ').unwrap_or(value);
                    attributes.push((name.trim().to_string(), value.to_string()));
                }
                None => tracing::debug!("Ignoring malformed manifest line: {}", line),
            }
        }

        Self { attributes }
    }

    /// Look up a main-section attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
