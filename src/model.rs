use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{FillError, Result};

pub const GCO_NAMESPACE: &str = "http://www.isotc211.org/2005/gco";
pub const GMD_NAMESPACE: &str = "http://www.isotc211.org/2005/gmd";

/// Namespace-resolved element name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementName {
    pub namespace: Option<String>,
    pub local: String,
}

impl ElementName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_owned),
            local: local.to_owned(),
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }
}

/// Where the property element of a [`LeafPath`] is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Direct child of the document root.
    RootChild,
    /// First match anywhere in document order.
    Descendant,
}

/// A `gmd:<property>/gco:<value>` pair addressing one text leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafPath {
    pub scope: Scope,
    pub property: &'static str,
    pub value: &'static str,
}

impl LeafPath {
    const fn new(scope: Scope, property: &'static str, value: &'static str) -> Self {
        Self {
            scope,
            property,
            value,
        }
    }
}

impl fmt::Display for LeafPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gmd:{}/gco:{}", self.property, self.value)
    }
}

pub const FILE_IDENTIFIER: LeafPath =
    LeafPath::new(Scope::RootChild, "fileIdentifier", "CharacterString");
pub const DATE_STAMP: LeafPath = LeafPath::new(Scope::RootChild, "dateStamp", "DateTime");
pub const TITLE: LeafPath = LeafPath::new(Scope::Descendant, "title", "CharacterString");
pub const WEST_BOUND: LeafPath = LeafPath::new(Scope::Descendant, "westBoundLongitude", "Decimal");
pub const EAST_BOUND: LeafPath = LeafPath::new(Scope::Descendant, "eastBoundLongitude", "Decimal");
pub const SOUTH_BOUND: LeafPath = LeafPath::new(Scope::Descendant, "southBoundLatitude", "Decimal");
pub const NORTH_BOUND: LeafPath = LeafPath::new(Scope::Descendant, "northBoundLatitude", "Decimal");

/// `chrono` format of `gmd:dateStamp`.
pub const DATE_STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Geographic bounding box in (west, east, south, north) order.
///
/// Always `west <= east` and `south <= north` with finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Envelope of arbitrary x/y edges, normalizing their order.
    pub fn from_edges(x1: f64, x2: f64, y1: f64, y2: f64) -> Self {
        Self {
            west: x1.min(x2),
            east: x1.max(x2),
            south: y1.min(y2),
            north: y1.max(y2),
        }
    }

    /// Envelope of a raster from its GDAL geo-transform and size in pixels.
    ///
    /// All four pixel corners go through the affine transform, so rotated
    /// rasters get the envelope of their footprint. For north-up rasters this
    /// is `x0, x0 + px * cols, y0 + py * rows, y0`.
    pub fn from_geo_transform(geo_transform: &[f64; 6], cols: usize, rows: usize) -> Self {
        let [x0, px, rx, y0, ry, py] = *geo_transform;
        let (w, h) = (cols as f64, rows as f64);

        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
        let mut bbox = Self {
            west: f64::INFINITY,
            east: f64::NEG_INFINITY,
            south: f64::INFINITY,
            north: f64::NEG_INFINITY,
        };
        for (col, row) in corners {
            let x = x0 + col * px + row * rx;
            let y = y0 + col * ry + row * py;
            bbox.west = bbox.west.min(x);
            bbox.east = bbox.east.max(x);
            bbox.south = bbox.south.min(y);
            bbox.north = bbox.north.max(y);
        }
        bbox
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            west: self.west.min(other.west),
            east: self.east.max(other.east),
            south: self.south.min(other.south),
            north: self.north.max(other.north),
        }
    }

    /// Rejects NaN or infinite edges, which cannot be written as `xs:decimal`.
    pub fn ensure_finite(self, path: &Path) -> Result<Self> {
        let edges = [self.west, self.east, self.south, self.north];
        if edges.iter().all(|v| v.is_finite()) {
            Ok(self)
        } else {
            Err(FillError::geo_reference(
                path,
                format!("non-finite extent {:?}", edges),
            ))
        }
    }

    /// Leaf paths paired with their values, in the order they are written.
    pub fn fields(&self) -> [(LeafPath, f64); 4] {
        [
            (WEST_BOUND, self.west),
            (EAST_BOUND, self.east),
            (SOUTH_BOUND, self.south),
            (NORTH_BOUND, self.north),
        ]
    }
}

/// `xs:decimal` lexical form. `Display` for `f64` never uses exponents.
pub fn format_decimal(value: f64) -> String {
    format!("{}", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Raster,
    Vector,
}

impl DatasetKind {
    /// Kind implied by the file name alone, `None` when the content decides.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("shp") => Some(DatasetKind::Vector),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Raster => f.write_str("raster"),
            DatasetKind::Vector => f.write_str("vector"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierOrigin {
    Generated,
    Existing,
}

/// What one fill run wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct FillReport {
    pub file_identifier: String,
    pub identifier_origin: IdentifierOrigin,
    pub date_stamp: String,
    pub title: Option<String>,
    pub extent: BoundingBox,
    pub dataset_kind: DatasetKind,
    pub output: PathBuf,
}
