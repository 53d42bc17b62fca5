// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Helpers shared across the compilation stages.

pub mod ident;
