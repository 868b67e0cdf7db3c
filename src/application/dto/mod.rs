//! # Data Transfer Objects
//!
//! Wire shapes of the escrow REST contract and their conversions into
//! domain types. The REST adapter and the in-memory escrow server both
//! speak these.

pub mod offer_dto;
pub mod trade_dto;

pub use offer_dto::{
    DEFAULT_PAGE_SIZE, OfferDto, OfferEnvelope, OfferFilter, OfferListResponse, OfferPage,
    OfferSort, PaginationDto, TraderDto,
};
pub use trade_dto::{
    CancelTradeRequest, CompletionParties, ErrorBody, InitiateTradeRequest, InitiateTradeResponse,
    InitiatedTrade, ProfileEnvelope, TradeDto, TradeEnvelope, TradePartnerDto, UserProfileDto,
};
