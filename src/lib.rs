pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

pub use error::{ListError, Result};

// Export logic types
pub use logic::{
    bind_reference, build_update_patch, collate, condition_matches, create_sort_tree,
    diff_objects, entity_matches, last_email_sent_string, parse_user_string, random_password,
    reference_options, DynamicFilterSpec, FilterContext, FilterEngine, FilterProvider,
    ListSorter, MemberFilter, MotionRepository, OptionCount, SharedFilterEngine, SortProperty,
    UpdatePatch, MOTION_COLLECTION_FIELDS,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{
    FilterStatePersister, FilterStateStore, JsonFileFilterStore, MemoryFilterStore,
    ReferenceCollection, ReferenceSource,
};
