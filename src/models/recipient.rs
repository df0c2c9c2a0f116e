use serde::{Deserialize, Serialize};

/// A notification or push-token recipient. Exactly one of the three role ids
/// is ever set; the enum makes the other combinations unrepresentable, and
/// the wire form keeps the three historical column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RecipientFields", into = "RecipientFields")]
pub enum Recipient {
    Owner(u64),
    Customer(u64),
    Partner(u64),
}

impl Recipient {
    pub fn from_parts(
        owner_id: Option<u64>,
        customer_id: Option<u64>,
        delivery_partner_id: Option<u64>,
    ) -> Result<Self, String> {
        match (owner_id, customer_id, delivery_partner_id) {
            (Some(id), None, None) => Ok(Recipient::Owner(id)),
            (None, Some(id), None) => Ok(Recipient::Customer(id)),
            (None, None, Some(id)) => Ok(Recipient::Partner(id)),
            (None, None, None) => Err(
                "one of owner_id, customer_id or delivery_partner_id is required".to_string(),
            ),
            _ => Err(
                "owner_id, customer_id and delivery_partner_id are mutually exclusive".to_string(),
            ),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct RecipientFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_partner_id: Option<u64>,
}

impl TryFrom<RecipientFields> for Recipient {
    type Error = String;

    fn try_from(fields: RecipientFields) -> Result<Self, Self::Error> {
        Recipient::from_parts(
            fields.owner_id,
            fields.customer_id,
            fields.delivery_partner_id,
        )
    }
}

impl From<Recipient> for RecipientFields {
    fn from(recipient: Recipient) -> Self {
        let mut fields = RecipientFields::default();
        match recipient {
            Recipient::Owner(id) => fields.owner_id = Some(id),
            Recipient::Customer(id) => fields.customer_id = Some(id),
            Recipient::Partner(id) => fields.delivery_partner_id = Some(id),
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::Recipient;

    #[test]
    fn exactly_one_role_id_deserializes() {
        let recipient: Recipient = serde_json::from_str(r#"{"customer_id": 7}"#).unwrap();
        assert_eq!(recipient, Recipient::Customer(7));
    }

    #[test]
    fn two_role_ids_are_rejected() {
        let result =
            serde_json::from_str::<Recipient>(r#"{"customer_id": 7, "owner_id": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn zero_role_ids_are_rejected() {
        let result = serde_json::from_str::<Recipient>("{}");
        assert!(result.is_err());
    }

    #[test]
    fn serializes_to_single_column() {
        let json = serde_json::to_value(Recipient::Partner(12)).unwrap();
        assert_eq!(json, serde_json::json!({"delivery_partner_id": 12}));
    }
}
