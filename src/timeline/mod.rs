pub(crate) mod model;
pub(crate) mod preview;
pub(crate) mod selection;
pub(crate) mod store;
