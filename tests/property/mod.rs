// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Normalization bounds, vocabulary mapping, slug derivation and plan
//! ordering checked with proptest.

mod normalization;
mod planning;
