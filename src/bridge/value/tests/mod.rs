//! Tests for operand values
