//! Shopping cart domain types.
//!
//! A cart starts anonymous (no customer reference) and becomes customer-owned
//! when the merge engine folds it into a customer's cart at login. Obsolete
//! flags are computed during reconciliation and never persisted.

use rust_decimal::Decimal;
use uuid::Uuid;

use driftwood_core::{AttributeId, CartId, CartItemId, CustomerId, OrderId, SelectionId, StoreId};

use super::product::{Product, ProductAttribute};

/// A shopping cart, store-scoped and identified by a stable code.
#[derive(Debug, Clone)]
pub struct Cart {
    /// Database ID; `None` until first persisted.
    pub id: Option<CartId>,
    /// Stable cart code handed to anonymous clients.
    pub code: String,
    /// Store this cart belongs to.
    pub store_id: StoreId,
    /// Owning customer; `None` while the cart is anonymous.
    pub customer_id: Option<CustomerId>,
    /// Set once the cart has been converted to an order. A cart with an
    /// order reference is terminal and excluded from active-cart lookup.
    pub order_id: Option<OrderId>,
    /// IP address of the last mutator, for audit.
    pub ip_address: Option<String>,
    /// Line items, in insertion order.
    pub line_items: Vec<CartItem>,
    /// Computed during reconciliation; an obsolete cart is a candidate for
    /// deletion by the caller. Never persisted.
    pub obsolete: bool,
}

impl Cart {
    /// Create a fresh anonymous cart for a store.
    #[must_use]
    pub fn new(store_id: StoreId) -> Self {
        Self {
            id: None,
            code: Uuid::new_v4().simple().to_string(),
            store_id,
            customer_id: None,
            order_id: None,
            ip_address: None,
            line_items: Vec::new(),
            obsolete: false,
        }
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Whether the cart has been converted to an order and must not change.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.order_id.is_some()
    }

    /// Total of all line-item subtotals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.line_items.iter().map(|item| item.sub_total).sum()
    }
}

/// One product entry within a cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    /// Database ID; `None` until first persisted.
    pub id: Option<CartItemId>,
    /// SKU of the referenced catalog product. The product itself is
    /// re-resolved on every reconciliation, never trusted from storage.
    pub sku: String,
    /// Units of the product; always positive.
    pub quantity: u32,
    /// Resolved product, attached during reconciliation. Transient.
    pub product: Option<Product>,
    /// Selected attributes. `None` means "no attributes", which downstream
    /// pricing treats the same as an empty set but callers can distinguish.
    pub attributes: Option<Vec<AttributeSelection>>,
    /// Unit price computed by the pricing collaborator.
    pub item_price: Decimal,
    /// `item_price * quantity`; recomputed on every reconciliation.
    pub sub_total: Decimal,
    /// Set when the product can no longer be resolved for this store.
    pub obsolete: bool,
    /// Copied from the resolved product.
    pub virtual_product: bool,
}

impl CartItem {
    /// Create an unpriced line item for a SKU.
    #[must_use]
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: None,
            sku: sku.into(),
            quantity,
            product: None,
            attributes: None,
            item_price: Decimal::ZERO,
            sub_total: Decimal::ZERO,
            obsolete: false,
            virtual_product: false,
        }
    }

    /// ID of the resolved product, if the item has been reconciled.
    #[must_use]
    pub fn product_id(&self) -> Option<driftwood_core::ProductId> {
        self.product.as_ref().map(|p| p.id)
    }

    /// The rebound product attributes of the surviving selections.
    #[must_use]
    pub fn selected_attributes(&self) -> Vec<ProductAttribute> {
        self.attributes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|s| s.attribute.clone())
            .collect()
    }
}

/// A customer's choice of one option/value pair on a line item.
#[derive(Debug, Clone)]
pub struct AttributeSelection {
    /// Database ID; `None` until first persisted.
    pub id: Option<SelectionId>,
    /// ID of the referenced product attribute. If the resolved product no
    /// longer offers this attribute, the selection is orphaned and deleted.
    pub attribute_id: AttributeId,
    /// Current attribute object, rebound during reconciliation. Transient.
    pub attribute: Option<ProductAttribute>,
}

impl AttributeSelection {
    /// Create an unpersisted selection referencing a product attribute.
    #[must_use]
    pub const fn new(attribute_id: AttributeId) -> Self {
        Self {
            id: None,
            attribute_id,
            attribute: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_new_cart_is_anonymous_and_open() {
        let cart = Cart::new(StoreId::new(1));
        assert!(cart.id.is_none());
        assert!(cart.customer_id.is_none());
        assert!(!cart.is_closed());
        assert!(cart.is_empty());
        assert_eq!(cart.code.len(), 32);
    }

    #[test]
    fn test_cart_subtotal_sums_items() {
        let mut cart = Cart::new(StoreId::new(1));
        let mut shirt = CartItem::new("SHIRT", 2);
        shirt.sub_total = dec!(20.00);
        let mut mug = CartItem::new("MUG", 1);
        mug.sub_total = dec!(7.50);
        cart.line_items = vec![shirt, mug];

        assert_eq!(cart.subtotal(), dec!(27.50));
    }

    #[test]
    fn test_closed_cart_has_order_reference() {
        let mut cart = Cart::new(StoreId::new(1));
        cart.order_id = Some(OrderId::new(99));
        assert!(cart.is_closed());
    }

    #[test]
    fn test_selected_attributes_skips_unbound_selections() {
        let mut item = CartItem::new("SHIRT", 1);
        item.attributes = Some(vec![
            AttributeSelection::new(AttributeId::new(1)),
            AttributeSelection {
                id: Some(SelectionId::new(5)),
                attribute_id: AttributeId::new(2),
                attribute: Some(ProductAttribute {
                    id: AttributeId::new(2),
                    option_id: 20,
                    value_id: 200,
                    option_name: "Size".to_owned(),
                    value_name: "L".to_owned(),
                    price_adjustment: dec!(1.00),
                }),
            },
        ]);

        let attrs = item.selected_attributes();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.first().unwrap().id, AttributeId::new(2));
    }
}
