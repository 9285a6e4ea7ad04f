//! Lead Generation API Library
//!
//! Scrapes search-engine results through a forward proxy, has a generative
//! language model structure the visible text into contact records, and serves
//! the result over HTTP behind a per-client rate limiter.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Lead pipeline, parsing and rate limiting.
//! - `integrations`: Outbound clients (search engine, proxy, Gemini).
//! - `app`: Router assembly and OpenAPI document.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `gemini_client`: Gemini `generateContent` client.
//! - `handlers`: HTTP request handlers.
//! - `html_text`: Results-page text extraction.
//! - `lead_parser`: Model output repair and parsing.
//! - `models`: Request, lead and health models.
//! - `rate_limit`: Per-client fixed-window limiter.
//! - `search_client`: Proxied search fetch and proxy health check.
//! - `services`: Lead extraction orchestrator.

pub mod api;
pub mod core;
pub mod integrations;

pub mod app;
pub mod config;
pub mod errors;
pub mod gemini_client;
pub mod handlers;
pub mod html_text;
pub mod lead_parser;
pub mod models;
pub mod rate_limit;
pub mod search_client;
pub mod services;
