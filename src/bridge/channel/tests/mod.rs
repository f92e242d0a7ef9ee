//! Tests for the operand channel
