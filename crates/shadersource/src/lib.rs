//! Shader source acquisition for triquad.
//!
//! A shader pair is addressed by two locator strings (file paths, `file://`
//! URLs, or `http(s)` URLs). [`load_pair`] retrieves both concurrently and
//! only succeeds once both texts are available; the result keeps the input
//! order, vertex first.

mod error;
mod locator;
mod provider;

use std::panic;
use std::thread;

pub use error::{LoadError, Role, SourceError};
pub use locator::Locator;
pub use provider::{DefaultProvider, SourceProvider};

/// The two shader texts, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Returns the texts as an ordered `[vertex, fragment]` array.
    pub fn into_array(self) -> [String; 2] {
        [self.vertex, self.fragment]
    }
}

/// Fetches the vertex and fragment sources in parallel.
///
/// Fails as a whole if either fetch fails. When both fail, the vertex error is
/// the one reported.
pub fn load_pair<P>(
    provider: &P,
    vertex: &str,
    fragment: &str,
) -> Result<ShaderSources, LoadError>
where
    P: SourceProvider + ?Sized,
{
    let (vertex_result, fragment_result) = thread::scope(|scope| {
        let vertex_task = scope.spawn(|| fetch_one(provider, Role::Vertex, vertex));
        let fragment_result = fetch_one(provider, Role::Fragment, fragment);
        let vertex_result = vertex_task
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload));
        (vertex_result, fragment_result)
    });

    let vertex = vertex_result?;
    let fragment = fragment_result?;
    tracing::debug!(
        vertex_bytes = vertex.len(),
        fragment_bytes = fragment.len(),
        "loaded shader sources"
    );
    Ok(ShaderSources { vertex, fragment })
}

fn fetch_one<P>(provider: &P, role: Role, raw: &str) -> Result<String, LoadError>
where
    P: SourceProvider + ?Sized,
{
    let wrap = |source| LoadError {
        role,
        locator: raw.to_string(),
        source,
    };
    let locator = Locator::parse(raw).map_err(wrap)?;
    tracing::debug!(%role, %locator, remote = locator.is_remote(), "fetching shader source");
    provider.fetch(&locator).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    struct MapProvider {
        entries: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MapProvider {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SourceProvider for MapProvider {
        fn fetch(&self, locator: &Locator) -> Result<String, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = locator.to_string();
            self.entries.get(&key).cloned().ok_or_else(|| SourceError::Io {
                path: key.into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    #[test]
    fn resolves_in_input_order() {
        let provider = MapProvider::new(&[("a.vert", "VERTEX"), ("b.frag", "FRAGMENT")]);
        let sources = load_pair(&provider, "a.vert", "b.frag").unwrap();
        assert_eq!(sources.into_array(), ["VERTEX".to_string(), "FRAGMENT".to_string()]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fragment_failure_rejects_the_pair() {
        let provider = MapProvider::new(&[("a.vert", "VERTEX")]);
        let err = load_pair(&provider, "a.vert", "missing.frag").unwrap_err();
        assert_eq!(err.role, Role::Fragment);
        assert_eq!(err.locator, "missing.frag");
    }

    #[test]
    fn vertex_failure_rejects_the_pair() {
        let provider = MapProvider::new(&[("b.frag", "FRAGMENT")]);
        let err = load_pair(&provider, "missing.vert", "b.frag").unwrap_err();
        assert_eq!(err.role, Role::Vertex);
    }

    #[test]
    fn empty_locator_fails_before_fetching() {
        let provider = MapProvider::new(&[("b.frag", "FRAGMENT")]);
        let err = load_pair(&provider, "", "b.frag").unwrap_err();
        assert!(matches!(err.source, SourceError::EmptyLocator));
    }

    #[test]
    fn fetches_run_concurrently() {
        // Both fetches must be in flight at once for the barrier to release.
        struct Rendezvous(Barrier);

        impl SourceProvider for Rendezvous {
            fn fetch(&self, locator: &Locator) -> Result<String, SourceError> {
                self.0.wait();
                Ok(locator.to_string())
            }
        }

        let provider = Rendezvous(Barrier::new(2));
        let sources = load_pair(&provider, "v.glsl", "f.glsl").unwrap();
        assert_eq!(sources, ShaderSources::new("v.glsl", "f.glsl"));
    }

    #[test]
    #[should_panic(expected = "vertex provider blew up")]
    fn vertex_fetch_panic_is_propagated() {
        struct Exploding;

        impl SourceProvider for Exploding {
            fn fetch(&self, locator: &Locator) -> Result<String, SourceError> {
                if locator.to_string().ends_with(".vert") {
                    panic!("vertex provider blew up");
                }
                Ok(String::new())
            }
        }

        let _ = load_pair(&Exploding, "a.vert", "b.frag");
    }
}
