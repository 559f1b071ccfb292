//! GraphQL operation definitions for Shopify Storefront API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` by hand: the
//! document is a string constant and the wire types live in a module named
//! after the operation, mirroring what the derive would generate.

// =============================================================================
// Documents
// =============================================================================

const PRODUCT_DOCUMENT: &str = r#"
query getProductByHandle($handle: String!) {
  product(handle: $handle) {
    id
    handle
    availableForSale
    title
    description
    tags
    options {
      name
      values
    }
    variants(first: 250) {
      edges {
        node {
          id
          title
          availableForSale
          sku
          selectedOptions {
            name
            value
          }
          price {
            amount
            currencyCode
          }
          coreCharge: metafield(namespace: "custom", key: "core_charge") {
            value
          }
          waiverAvailable: metafield(namespace: "custom", key: "waiver_available") {
            value
          }
          coreVariantId: metafield(namespace: "custom", key: "corevariant") {
            value
          }
          estimatedDelivery: metafield(namespace: "custom", key: "delivery") {
            value
          }
          mileage: metafield(namespace: "custom", key: "mileage") {
            value
          }
          condition: metafield(namespace: "custom", key: "condition") {
            value
          }
          addOnQuantity: metafield(namespace: "custom", key: "add_on_quantity") {
            value
          }
          addOnProductId: metafield(namespace: "custom", key: "add_on") {
            value
          }
        }
      }
    }
  }
}
"#;

/// Cart selection shared by every cart operation, appended with `concat!`.
macro_rules! cart_fragment {
    () => {
        r"
fragment cart on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount {
      amount
      currencyCode
    }
    totalAmount {
      amount
      currencyCode
    }
  }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        cost {
          totalAmount {
            amount
            currencyCode
          }
        }
        merchandise {
          ... on ProductVariant {
            id
            title
            product {
              title
              handle
            }
          }
        }
      }
    }
  }
}
"
    };
}

const CREATE_CART_DOCUMENT: &str = concat!(
    r"
mutation createCart($lines: [CartLineInput!]) {
  cartCreate(input: { lines: $lines }) {
    cart {
      ...cart
    }
    userErrors {
      code
      field
      message
    }
  }
}
",
    cart_fragment!()
);

const ADD_TO_CART_DOCUMENT: &str = concat!(
    r"
mutation addToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart {
      ...cart
    }
    userErrors {
      code
      field
      message
    }
  }
}
",
    cart_fragment!()
);

const GET_CART_DOCUMENT: &str = concat!(
    r"
query getCart($cartId: ID!) {
  cart(id: $cartId) {
    ...cart
  }
}
",
    cart_fragment!()
);

operation!(
    GetProductByHandle,
    get_product_by_handle,
    "getProductByHandle",
    PRODUCT_DOCUMENT
);
operation!(CreateCart, create_cart, "createCart", CREATE_CART_DOCUMENT);
operation!(AddToCart, add_to_cart, "addToCart", ADD_TO_CART_DOCUMENT);
operation!(GetCart, get_cart, "getCart", GET_CART_DOCUMENT);

// =============================================================================
// Wire Types
// =============================================================================

/// A `{ value }` metafield selection.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Metafield {
    pub value: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

pub mod get_product_by_handle {
    use serde::{Deserialize, Serialize};

    use super::{Connection, Metafield, MoneyV2};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<Product>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Product {
        pub id: String,
        pub handle: String,
        pub available_for_sale: bool,
        pub title: String,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub tags: Vec<String>,
        #[serde(default)]
        pub options: Vec<ProductOption>,
        pub variants: Connection<Variant>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductOption {
        pub name: String,
        pub values: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SelectedOption {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variant {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub sku: Option<String>,
        pub selected_options: Vec<SelectedOption>,
        pub price: MoneyV2,
        pub core_charge: Option<Metafield>,
        pub waiver_available: Option<Metafield>,
        pub core_variant_id: Option<Metafield>,
        pub estimated_delivery: Option<Metafield>,
        pub mileage: Option<Metafield>,
        pub condition: Option<Metafield>,
        pub add_on_quantity: Option<Metafield>,
        pub add_on_product_id: Option<Metafield>,
    }
}

/// Cart selection shared by every cart operation.
pub mod cart_fields {
    use serde::Deserialize;

    use super::{Connection, MoneyV2};

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Cart {
        pub id: String,
        pub checkout_url: String,
        pub total_quantity: i64,
        pub cost: CartCost,
        pub lines: Connection<CartLine>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCost {
        pub subtotal_amount: MoneyV2,
        pub total_amount: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineCost {
        pub total_amount: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartLine {
        pub id: String,
        pub quantity: i64,
        pub cost: CartLineCost,
        pub merchandise: Merchandise,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Merchandise {
        pub id: String,
        pub title: String,
        pub product: MerchandiseProduct,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MerchandiseProduct {
        pub title: String,
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserError {
        pub code: Option<String>,
        pub field: Option<Vec<String>>,
        pub message: String,
    }
}

pub mod create_cart {
    use serde::{Deserialize, Serialize};

    use super::cart_fields::{Cart, UserError};
    use crate::shopify::types::CartLineInput;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub cart: Option<Cart>,
        pub user_errors: Vec<UserError>,
    }
}

pub mod add_to_cart {
    use serde::{Deserialize, Serialize};

    use super::cart_fields::{Cart, UserError};
    use crate::shopify::types::CartLineInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub cart: Option<Cart>,
        pub user_errors: Vec<UserError>,
    }
}

pub mod get_cart {
    use serde::{Deserialize, Serialize};

    use super::cart_fields::Cart;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<Cart>,
    }
}
