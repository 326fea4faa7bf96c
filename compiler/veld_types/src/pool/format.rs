//! Type formatting for debugging.
//!
//! This is the debug dump surface only; the real textual printer is an
//! external collaborator.

#![allow(clippy::format_push_string)] // Debug formatting prioritizes clarity over allocation

use crate::{Idx, Pool, Tag};

impl Pool {
    /// Format a type as a human-readable string.
    pub fn format_type(&self, idx: Idx) -> String {
        let mut buf = String::new();
        self.format_type_into(idx, &mut buf);
        buf
    }

    /// Format a type into an existing string buffer.
    pub fn format_type_into(&self, idx: Idx, buf: &mut String) {
        let mut visiting = Vec::new();
        self.format_inner(idx, buf, &mut visiting);
    }

    fn format_inner(&self, idx: Idx, buf: &mut String, visiting: &mut Vec<Idx>) {
        // Self-referential shapes are legal; mark the back-edge instead
        // of recursing forever.
        if visiting.contains(&idx) {
            buf.push_str("<recursive>");
            return;
        }
        visiting.push(idx);

        match self.tag(idx) {
            Tag::Void => buf.push_str("void"),
            Tag::Float => buf.push_str("float"),
            Tag::Double => buf.push_str("double"),
            Tag::Label => buf.push_str("label"),
            Tag::Integer => buf.push_str(&format!("i{}", self.integer_width(idx))),
            Tag::Pointer => {
                self.format_inner(self.element_type(idx), buf, visiting);
                buf.push('*');
            }
            Tag::Array => {
                buf.push_str(&format!("[{} x ", self.array_len(idx)));
                self.format_inner(self.element_type(idx), buf, visiting);
                buf.push(']');
            }
            Tag::Vector => {
                buf.push_str(&format!("<{} x ", self.vector_len(idx)));
                self.format_inner(self.element_type(idx), buf, visiting);
                buf.push('>');
            }
            Tag::Struct => {
                let packed = self.struct_is_packed(idx);
                if packed {
                    buf.push('<');
                }
                buf.push_str("{ ");
                for i in 0..self.struct_field_count(idx) {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    self.format_inner(self.struct_field(idx, i), buf, visiting);
                }
                buf.push_str(" }");
                if packed {
                    buf.push('>');
                }
            }
            Tag::Function => {
                self.format_inner(self.function_return(idx), buf, visiting);
                buf.push_str(" (");
                let count = self.function_param_count(idx);
                for i in 0..count {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    self.format_inner(self.function_param(idx, i), buf, visiting);
                }
                if self.function_is_vararg(idx) {
                    if count > 0 {
                        buf.push_str(", ");
                    }
                    buf.push_str("...");
                }
                buf.push(')');
            }
            Tag::Opaque => buf.push_str("opaque"),
        }

        visiting.pop();
    }
}
