use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use foundation::ids::{DatasetId, LayerId};

use crate::arcs::ArcCollection;
use crate::layer::Layer;

/// A named collection of layers sharing one arc collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: Option<String>,
    pub layers: Vec<Layer>,
    /// Topology shared by the dataset's path layers. `None` for point-only data.
    pub arcs: Option<ArcCollection>,
}

impl Dataset {
    pub fn new(id: DatasetId, layers: Vec<Layer>, arcs: Option<ArcCollection>) -> Self {
        Self {
            id,
            name: None,
            layers,
            arcs,
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }
}

/// Shared, in-place mutable handle to a dataset.
///
/// The model and every render group representing the dataset hold clones of
/// the same handle; editing operations mutate through it. Equality is dataset
/// identity.
#[derive(Clone)]
pub struct DatasetHandle {
    id: DatasetId,
    inner: Rc<RefCell<Dataset>>,
}

impl DatasetHandle {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            id: dataset.id,
            inner: Rc::new(RefCell::new(dataset)),
        }
    }

    pub fn id(&self) -> DatasetId {
        self.id
    }

    pub fn borrow(&self) -> Ref<'_, Dataset> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Dataset> {
        self.inner.borrow_mut()
    }
}

impl PartialEq for DatasetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DatasetHandle {}

impl fmt::Debug for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatasetHandle").field(&self.id).finish()
    }
}
