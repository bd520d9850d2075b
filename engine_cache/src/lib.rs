pub use crate::{
    header_cache::{HeaderCache, HeaderCacheConfig, HEADER_CACHE_LIFESPAN, HEADER_CACHE_SIZE},
    payload_id_cache::{PayloadIdCache, PAYLOAD_ID_CACHE_WINDOW},
};

mod header_cache;
mod payload_id_cache;
