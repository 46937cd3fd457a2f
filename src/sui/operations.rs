//! Transaction payload builders
//!
//! Each builder is a pure function from validated parameters to one
//! [`Payload`]. Chain lookups (stakes, coins, capabilities) happen before a
//! builder is called.

use crate::sui::types::{
    Coin, ObjectId, Stake, SuiAddress, MIST_PER_SUI, SUI_SYSTEM_PACKAGE, SUI_SYSTEM_STATE_OBJECT,
};
use crate::{Error, Result};
use serde_json::{json, Value};
use std::fmt;

/// Gas budget always attached to commission rate updates (0.1 SUI).
///
/// Dry-run estimation undershoots for `request_set_commission_rate`.
pub const COMMISSION_RATE_GAS_BUDGET: u64 = 100_000_000;

const SUI_SYSTEM_MODULE: &str = "sui_system";

/// Argument of a Move call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Object(ObjectId),
    U64(u64),
}

impl CallArg {
    /// JSON-RPC form: object ids and integers are both passed as strings
    pub fn to_json(&self) -> Value {
        match self {
            CallArg::Object(id) => json!(id.as_str()),
            CallArg::U64(v) => json!(v.to_string()),
        }
    }
}

/// A call to a Move entry function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: &'static str,
    pub function: &'static str,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<CallArg>,
    pub gas_budget: Option<u64>,
}

impl MoveCall {
    fn system(function: &'static str, arguments: Vec<CallArg>) -> Self {
        Self {
            package: ObjectId::from_short(SUI_SYSTEM_PACKAGE),
            module: SUI_SYSTEM_MODULE,
            function,
            type_arguments: Vec::new(),
            arguments,
            gas_budget: None,
        }
    }

    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// Split `amount` MIST off the input coins and transfer it to `recipient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaySui {
    pub input_coins: Vec<ObjectId>,
    pub recipient: SuiAddress,
    pub amount: u64,
    pub gas_budget: Option<u64>,
}

/// Transaction shapes the toolkit can submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    MoveCall(MoveCall),
    PaySui(PaySui),
}

impl Payload {
    /// Explicit gas budget, if the payload needs one
    pub fn gas_budget(&self) -> Option<u64> {
        match self {
            Payload::MoveCall(call) => call.gas_budget,
            Payload::PaySui(pay) => pay.gas_budget,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::MoveCall(call) => f.write_str(&call.target()),
            Payload::PaySui(pay) => write!(f, "pay {} MIST to {}", pay.amount, pay.recipient),
        }
    }
}

fn system_state() -> CallArg {
    CallArg::Object(ObjectId::from_short(SUI_SYSTEM_STATE_OBJECT))
}

/// `0x3::sui_system::request_withdraw_stake(system_state, staked_sui)`
pub fn withdraw_stake(stake: &Stake) -> Payload {
    Payload::MoveCall(MoveCall::system(
        "request_withdraw_stake",
        vec![system_state(), CallArg::Object(stake.staked_sui_id.clone())],
    ))
}

/// Send `amount_mist` to `recipient`, paid from the signer's SUI coins
pub fn send_sui(coins: &[Coin], recipient: &SuiAddress, amount_mist: u64) -> Result<Payload> {
    if coins.is_empty() {
        return Err(Error::InvalidArgument(
            "no SUI coins available to pay from".to_string(),
        ));
    }

    Ok(Payload::PaySui(PaySui {
        input_coins: coins.iter().map(|c| c.coin_object_id.clone()).collect(),
        recipient: recipient.clone(),
        amount: amount_mist,
        gas_budget: None,
    }))
}

/// `0x3::sui_system::request_set_gas_price(system_state, cap, price)`
pub fn set_gas_price(operation_cap: &ObjectId, price: u64) -> Payload {
    Payload::MoveCall(MoveCall::system(
        "request_set_gas_price",
        vec![
            system_state(),
            CallArg::Object(operation_cap.clone()),
            CallArg::U64(price),
        ],
    ))
}

/// `0x3::sui_system::request_set_commission_rate(system_state, rate)`
pub fn set_commission_rate(rate: u64) -> Payload {
    let mut call = MoveCall::system(
        "request_set_commission_rate",
        vec![system_state(), CallArg::U64(rate)],
    );
    call.gas_budget = Some(COMMISSION_RATE_GAS_BUDGET);
    Payload::MoveCall(call)
}

/// Parse a human SUI amount ("2.5") into MIST without going through floats
pub fn parse_sui_amount(amount: &str) -> std::result::Result<u64, String> {
    let amount = amount.trim();
    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(format!("'{}' is not a valid SUI amount", amount));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(format!("'{}' is not a valid SUI amount", amount));
    }
    if fraction.len() > 9 {
        return Err(format!(
            "'{}' has more than 9 decimal places (1 MIST = 0.000000001 SUI)",
            amount
        ));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| format!("'{}' is too large", amount))?
    };
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<9}", fraction)
            .parse()
            .map_err(|_| format!("'{}' is not a valid SUI amount", amount))?
    };

    let mist = whole
        .checked_mul(MIST_PER_SUI)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| format!("'{}' is too large", amount))?;

    if mist == 0 {
        return Err("amount must be greater than zero".to_string());
    }
    Ok(mist)
}

/// Format MIST as a SUI amount for messages
pub fn format_sui(mist: u64) -> String {
    let whole = mist / MIST_PER_SUI;
    let fraction = mist % MIST_PER_SUI;
    if fraction == 0 {
        whole.to_string()
    } else {
        let fraction = format!("{:09}", fraction);
        format!("{}.{}", whole, fraction.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stake(id: u8) -> Stake {
        Stake {
            staked_sui_id: ObjectId::from_short(id),
            stake_request_epoch: None,
            stake_active_epoch: None,
            principal: None,
            status: None,
            estimated_reward: None,
        }
    }

    fn coin(id: u8) -> Coin {
        Coin {
            coin_type: crate::sui::types::SUI_COIN_TYPE.to_string(),
            coin_object_id: ObjectId::from_short(id),
            version: "1".to_string(),
            digest: "d".to_string(),
            balance: "1000".to_string(),
        }
    }

    #[test]
    fn test_withdraw_payload() {
        let Payload::MoveCall(call) = withdraw_stake(&stake(0x42)) else {
            panic!("expected a move call");
        };
        assert_eq!(
            call.target(),
            format!("{}::sui_system::request_withdraw_stake", ObjectId::from_short(3))
        );
        assert_eq!(
            call.arguments,
            vec![
                CallArg::Object(ObjectId::from_short(5)),
                CallArg::Object(ObjectId::from_short(0x42)),
            ]
        );
        assert_eq!(call.gas_budget, None);
    }

    #[test]
    fn test_send_amount_scaling() {
        assert_eq!(parse_sui_amount("2.5"), Ok(2_500_000_000));
        assert_eq!(parse_sui_amount("1"), Ok(1_000_000_000));
        assert_eq!(parse_sui_amount("0.000000001"), Ok(1));
        assert_eq!(parse_sui_amount(".5"), Ok(500_000_000));
        assert_eq!(parse_sui_amount("3."), Ok(3_000_000_000));
    }

    #[test]
    fn test_send_amount_rejects_invalid() {
        assert!(parse_sui_amount("0").is_err());
        assert!(parse_sui_amount("-1").is_err());
        assert!(parse_sui_amount("abc").is_err());
        assert!(parse_sui_amount(".").is_err());
        assert!(parse_sui_amount("1.0000000001").is_err());
        assert!(parse_sui_amount("1e9").is_err());
        assert!(parse_sui_amount("99999999999999999999").is_err());
    }

    #[test]
    fn test_send_payload() {
        let recipient: SuiAddress = "0xbeef".parse().unwrap();
        let amount = parse_sui_amount("2.5").unwrap();
        let payload = send_sui(&[coin(1), coin(2)], &recipient, amount).unwrap();

        let Payload::PaySui(pay) = payload else {
            panic!("expected a pay payload");
        };
        assert_eq!(pay.amount, 2_500_000_000);
        assert_eq!(pay.recipient, recipient);
        assert_eq!(
            pay.input_coins,
            vec![ObjectId::from_short(1), ObjectId::from_short(2)]
        );
    }

    #[test]
    fn test_send_requires_coins() {
        let recipient: SuiAddress = "0xbeef".parse().unwrap();
        assert!(matches!(
            send_sui(&[], &recipient, 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_gas_price_payload() {
        let cap = ObjectId::from_short(0x77);
        let Payload::MoveCall(call) = set_gas_price(&cap, 750) else {
            panic!("expected a move call");
        };
        assert_eq!(call.function, "request_set_gas_price");
        assert_eq!(
            call.arguments,
            vec![
                CallArg::Object(ObjectId::from_short(5)),
                CallArg::Object(cap),
                CallArg::U64(750),
            ]
        );
    }

    #[test]
    fn test_commission_rate_always_has_gas_budget() {
        for rate in [0, 1, 200, 10_000, u64::MAX] {
            let payload = set_commission_rate(rate);
            assert_eq!(payload.gas_budget(), Some(COMMISSION_RATE_GAS_BUDGET));
            let Payload::MoveCall(call) = payload else {
                panic!("expected a move call");
            };
            assert_eq!(call.arguments[1], CallArg::U64(rate));
        }
    }

    #[test]
    fn test_call_arg_json() {
        assert_eq!(CallArg::U64(12).to_json(), json!("12"));
        assert_eq!(
            CallArg::Object(ObjectId::from_short(5)).to_json(),
            json!(ObjectId::from_short(5).as_str())
        );
    }

    #[test]
    fn test_format_sui() {
        assert_eq!(format_sui(2_500_000_000), "2.5");
        assert_eq!(format_sui(1_000_000_000), "1");
        assert_eq!(format_sui(1), "0.000000001");
    }
}
