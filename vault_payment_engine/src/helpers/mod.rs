mod topup_id;

pub use topup_id::{mint_topup_id, parse_topup_id, TopUpId};
