use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// A rendered visual (typically a chart) described as an SVG element tree.
///
/// Cloning is cheap: the parsed tree is shared.
#[derive(Clone)]
pub struct Element {
    tree: Arc<usvg::Tree>,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.tree.size();
        f.debug_struct("Element")
            .field("width", &size.width())
            .field("height", &size.height())
            .finish()
    }
}

impl Element {
    pub fn from_svg_str(svg: &str) -> ReelResult<Self> {
        Self::from_svg_data(svg.as_bytes(), None)
    }

    /// Parse SVG bytes. Relative image hrefs resolve against `resources_dir`.
    pub fn from_svg_data(bytes: &[u8], resources_dir: Option<PathBuf>) -> ReelResult<Self> {
        let opts = usvg::Options {
            resources_dir,
            fontdb: shared_fontdb(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(bytes, &opts)
            .map_err(|e| ReelError::validation(format!("parse svg element: {e}")))?;
        let size = tree.size();
        if !(size.width() > 0.0 && size.height() > 0.0) {
            return Err(ReelError::validation("svg element has zero width/height"));
        }
        Ok(Self {
            tree: Arc::new(tree),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read svg element '{}'", path.display()))?;
        Self::from_svg_data(&bytes, path.parent().map(Path::to_path_buf))
    }

    pub fn tree(&self) -> &usvg::Tree {
        &self.tree
    }

    /// Intrinsic size in SVG user units.
    pub fn size(&self) -> (f64, f64) {
        let size = self.tree.size();
        (f64::from(size.width()), f64::from(size.height()))
    }
}

/// System fonts are loaded once per process; loading them is by far the slowest part of parsing.
fn shared_fontdb() -> Arc<usvg::fontdb::Database> {
    static DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    })
    .clone()
}
