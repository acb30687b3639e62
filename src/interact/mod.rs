pub(crate) mod controller;
pub(crate) mod handles;
pub(crate) mod text_edit;
