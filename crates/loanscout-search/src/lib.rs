//! LoanScout search - from a free-text query to a ranked list of loan offers.
//!
//! [`LoanSearchService::search_loans`] never fails: parse problems, invalid
//! values and collaborator errors come back as [`SearchResponse::Failure`].

pub mod dto;
pub mod service;

pub use dto::{
    LoanOffer, SearchFailure, SearchFailureKind, SearchParameters, SearchRequest, SearchResponse,
    SearchResults,
};
pub use service::LoanSearchService;
