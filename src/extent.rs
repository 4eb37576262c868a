use std::path::{Path, PathBuf};

use gdal::spatial_ref::SpatialRef;
use gdal::vector::LayerAccess;
use gdal::Dataset;
use tracing::{debug, warn};

use crate::error::{FillError, Result};
use crate::model::{BoundingBox, DatasetKind};

/// Source of the spatial extent written into the bounding-box fields.
pub trait ExtentProvider {
    fn kind(&self) -> DatasetKind;

    /// Extent in (west, east, south, north) order, in the dataset's CRS.
    fn extent(&self) -> Result<BoundingBox>;
}

/// Opens `path` with GDAL and picks the provider for its content.
///
/// A `.shp` extension means vector. Otherwise a dataset with no raster
/// bands but at least one layer is vector, and anything else is raster.
pub fn open_extent_provider(path: &Path) -> Result<Box<dyn ExtentProvider>> {
    let dataset = open_dataset(path)?;
    let kind = DatasetKind::from_path(path).unwrap_or_else(|| {
        if dataset.raster_count() == 0 && dataset.layer_count() > 0 {
            DatasetKind::Vector
        } else {
            DatasetKind::Raster
        }
    });
    debug!("Opened {:?} as {} dataset", path, kind);

    Ok(match kind {
        DatasetKind::Raster => Box::new(RasterExtentProvider::from_dataset(path, dataset)),
        DatasetKind::Vector => Box::new(VectorExtentProvider::from_dataset(path, dataset)),
    })
}

fn open_dataset(path: &Path) -> Result<Dataset> {
    Dataset::open(path).map_err(|source| FillError::DatasetOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn warn_if_projected(path: &Path, srs: Option<SpatialRef>) {
    match srs {
        Some(srs) if !srs.is_geographic() => warn!(
            "{:?} uses a projected CRS; bounding box is written in native coordinates",
            path
        ),
        Some(_) => {}
        None => debug!("{:?} has no spatial reference", path),
    }
}

/// Extent from the geo-transform and size of a raster.
pub struct RasterExtentProvider {
    path: PathBuf,
    dataset: Dataset,
}

impl RasterExtentProvider {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_dataset(path, open_dataset(path)?))
    }

    fn from_dataset(path: &Path, dataset: Dataset) -> Self {
        Self {
            path: path.to_path_buf(),
            dataset,
        }
    }
}

impl ExtentProvider for RasterExtentProvider {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Raster
    }

    fn extent(&self) -> Result<BoundingBox> {
        let (cols, rows) = self.dataset.raster_size();
        if cols == 0 || rows == 0 {
            return Err(FillError::geo_reference(&self.path, "raster has no pixels"));
        }

        let geo_transform = match self.dataset.geo_transform() {
            Ok(geo_transform) => geo_transform,
            Err(e) => {
                let reason = format!("no geo-transform: {}", e);
                return Err(FillError::geo_reference(&self.path, reason));
            }
        };
        debug!(
            "Raster {:?}: {} x {} pixels, geo-transform {:?}, projection {:?}",
            self.path,
            cols,
            rows,
            geo_transform,
            self.dataset.projection()
        );
        warn_if_projected(&self.path, self.dataset.spatial_ref().ok());

        BoundingBox::from_geo_transform(&geo_transform, cols, rows).ensure_finite(&self.path)
    }
}

/// Extent covering every layer of a vector dataset.
pub struct VectorExtentProvider {
    path: PathBuf,
    dataset: Dataset,
}

impl VectorExtentProvider {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_dataset(path, open_dataset(path)?))
    }

    fn from_dataset(path: &Path, dataset: Dataset) -> Self {
        Self {
            path: path.to_path_buf(),
            dataset,
        }
    }
}

impl ExtentProvider for VectorExtentProvider {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Vector
    }

    fn extent(&self) -> Result<BoundingBox> {
        let mut extent: Option<BoundingBox> = None;

        for layer in self.dataset.layers() {
            let envelope = layer.get_extent().map_err(|e| {
                FillError::geo_reference(
                    &self.path,
                    format!("layer '{}' has no extent: {}", layer.name(), e),
                )
            })?;
            let layer_extent = BoundingBox::from_edges(
                envelope.MinX,
                envelope.MaxX,
                envelope.MinY,
                envelope.MaxY,
            );
            debug!(
                "Layer '{}' of {:?}: {:?}",
                layer.name(),
                self.path,
                layer_extent
            );
            warn_if_projected(&self.path, layer.spatial_ref());

            extent = Some(match extent {
                Some(acc) => acc.union(&layer_extent),
                None => layer_extent,
            });
        }

        match extent {
            Some(extent) => extent.ensure_finite(&self.path),
            None => Err(FillError::geo_reference(&self.path, "no layers")),
        }
    }
}
