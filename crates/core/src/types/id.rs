//! Newtype IDs for type-safe entity references.
//!
//! Shopify identifies everything with opaque global IDs such as
//! `gid://shopify/ProductVariant/4242`. Use the `define_gid!` macro to create
//! wrappers that keep a variant ID from being passed where a cart ID belongs.

/// Macro to define a type-safe Shopify global ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `numeric_id()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use reman_core::define_gid;
/// define_gid!(ProductId);
/// define_gid!(VariantId);
///
/// let product = ProductId::new("gid://shopify/Product/1");
/// let variant = VariantId::new("gid://shopify/ProductVariant/1");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = variant;
/// assert_eq!(product.numeric_id(), Some("1"));
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a global ID string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying global ID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The trailing numeric segment of the global ID, if present.
            #[must_use]
            pub fn numeric_id(&self) -> Option<&str> {
                self.0
                    .rsplit('/')
                    .next()
                    .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_gid!(ProductId);
define_gid!(VariantId);
define_gid!(CartId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id() {
        let id = VariantId::new("gid://shopify/ProductVariant/4242");
        assert_eq!(id.numeric_id(), Some("4242"));
        assert_eq!(id.to_string(), "gid://shopify/ProductVariant/4242");
    }

    #[test]
    fn test_numeric_id_missing() {
        assert_eq!(CartId::new("gid://shopify/Cart/abc?key=1").numeric_id(), None);
    }
}
