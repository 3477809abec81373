mod store;

#[doc(inline)]
pub use store::AttributeStore;
