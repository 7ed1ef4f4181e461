//! Tagged continuation stages for the two asynchronous commands.
//!
//! `StreamerContext` runs `START_VIDEO`/`LIST_VIDEOS` as plain `async fn`s, but
//! records which stage is in flight in these small enums so logging, tests, and
//! diagnostics can observe progress without threading extra state through the
//! dispatch code — the same role the reference spec's tagged continuations
//! play in a callback-chain implementation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartVideoStage {
    FetchCatalogHeader,
    FetchVideoHeader,
    FetchIndex,
    FetchChunk { bank: u8, chunk_num: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStage {
    FetchCatalog,
}
