//! GraphQL operations for the Shopify Customer Account API.

const CUSTOMER_DOCUMENT: &str = r"
query getCustomer {
  customer {
    emailAddress {
      emailAddress
    }
    firstName
    lastName
    tags
  }
}
";

const ORDERS_DOCUMENT: &str = r"
query getOrders($first: Int!) {
  customer {
    orders(first: $first, sortKey: PROCESSED_AT, reverse: true) {
      edges {
        node {
          id
          name
          number
          processedAt
          financialStatus
          fulfillmentStatus
          totalPrice {
            amount
            currencyCode
          }
        }
      }
    }
  }
}
";

operation!(GetCustomer, get_customer, "getCustomer", CUSTOMER_DOCUMENT);
operation!(GetOrders, get_orders, "getOrders", ORDERS_DOCUMENT);

pub mod get_customer {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Variables;

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub customer: Customer,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Customer {
        pub email_address: Option<EmailAddress>,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        #[serde(default)]
        pub tags: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EmailAddress {
        pub email_address: Option<String>,
    }
}

pub mod get_orders {
    use serde::{Deserialize, Serialize};

    use crate::shopify::storefront::queries::{Connection, MoneyV2};

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub customer: Customer,
    }

    #[derive(Debug, Deserialize)]
    pub struct Customer {
        pub orders: Connection<Order>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Order {
        pub id: String,
        pub name: String,
        pub number: i64,
        pub processed_at: String,
        pub financial_status: Option<String>,
        pub fulfillment_status: Option<String>,
        pub total_price: MoneyV2,
    }
}
