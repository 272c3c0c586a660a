//! Error handling tests for payarc

use payarc::abi::{decode_invoice, parse_address, Decoder};
use payarc::wallet::WalletFactory;
use payarc::{parse_units, PayArcError};

#[test]
fn test_invoice_not_found_error() {
    let error = PayArcError::InvoiceNotFound {
        id: "INV-404".to_string(),
    };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("Invoice not found"),
        "Error message MUST contain 'Invoice not found' - actual: {}",
        error_msg
    );
    assert!(
        error_msg.contains("INV-404"),
        "Error message MUST contain the invoice id - actual: {}",
        error_msg
    );
}

#[test]
fn test_insufficient_funds_error() {
    let error = PayArcError::InsufficientFunds {
        required: "2000000".to_string(),
        available: "1500000".to_string(),
    };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("Insufficient funds"),
        "Error message MUST contain 'Insufficient funds' - actual: {}",
        error_msg
    );
    assert!(
        error_msg.contains("2000000") && error_msg.contains("1500000"),
        "Error message MUST contain both amounts - actual: {}",
        error_msg
    );
}

#[test]
fn test_not_owner_error() {
    let error = PayArcError::NotOwner {
        owner: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
        connected: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
    };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("owner"),
        "Error message MUST mention the owner - actual: {}",
        error_msg
    );
    assert!(
        error_msg.contains("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
        "Error message MUST contain the connected account - actual: {}",
        error_msg
    );
}

#[test]
fn test_wallet_not_connected_error() {
    let error = PayArcError::WalletNotConnected;
    assert_eq!(error.to_string(), "Wallet not connected");
}

#[test]
fn test_busy_error() {
    let error = PayArcError::Busy;
    assert_eq!(error.to_string(), "Another operation is in progress");
}

#[test]
fn test_rpc_error() {
    let error = PayArcError::Rpc {
        code: -32000,
        message: "nonce too low".to_string(),
        data: None,
    };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("-32000"),
        "Error message MUST contain the RPC error code - actual: {}",
        error_msg
    );
    assert!(
        error_msg.contains("nonce too low"),
        "Error message MUST contain the RPC error message - actual: {}",
        error_msg
    );
    assert!(!error.is_revert());
}

#[test]
fn test_revert_errors() {
    let reverted = PayArcError::ContractReverted {
        reason: "Invoice already paid".to_string(),
    };
    assert!(reverted.is_revert());
    assert_eq!(
        reverted.to_string(),
        "Contract reverted: Invoice already paid"
    );

    let failed = PayArcError::TransactionFailed {
        hash: "0xabc".to_string(),
    };
    assert!(failed.is_revert());
    assert!(failed.to_string().contains("0xabc"));
}

#[test]
fn test_chain_mismatch_error() {
    let error = PayArcError::ChainMismatch {
        expected: 5_042_002,
        actual: 1,
    };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("5042002") && error_msg.contains("1"),
        "Error message MUST contain both chain ids - actual: {}",
        error_msg
    );
}

#[test]
fn test_invalid_address_is_reported() {
    for bad in [
        "0x",
        "0x1234",
        "f39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "0xzz9Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    ] {
        match parse_address(bad) {
            Err(PayArcError::InvalidAddress { address }) => assert_eq!(address, bad),
            other => panic!("Expected InvalidAddress for {:?}, got: {:?}", bad, other),
        }
    }
}

#[test]
fn test_invalid_amount_is_reported() {
    let error = parse_units("1.2345678", 6).unwrap_err();
    let error_msg = error.to_string();
    assert!(
        error_msg.contains("Invalid amount"),
        "Error message MUST contain 'Invalid amount' - actual: {}",
        error_msg
    );
    assert!(
        error_msg.contains("decimal places"),
        "Error message MUST explain the precision problem - actual: {}",
        error_msg
    );
}

#[test]
fn test_invalid_private_key_is_reported() {
    for bad in ["", "0x1234", "not-a-key"] {
        assert!(
            matches!(
                WalletFactory::from_private_key(bad),
                Err(PayArcError::Wallet { .. })
            ),
            "key {:?} should be rejected",
            bad
        );
    }

    // Zero is not a valid secp256k1 scalar
    let zero = format!("0x{}", "0".repeat(64));
    assert!(WalletFactory::from_private_key(&zero).is_err());
}

#[test]
fn test_truncated_return_data_is_reported() {
    let error = decode_invoice(&[0u8; 31]).unwrap_err();
    assert!(matches!(error, PayArcError::AbiDecode { .. }));
    assert!(error.to_string().contains("ABI decoding failed"));

    let decoder = Decoder::new(&[]);
    assert!(decoder.uint(0).is_err());

    let mut dirty = vec![0u8; 32];
    dirty[0] = 1;
    assert!(Decoder::new(&dirty).address(0).is_err());
}

#[test]
fn test_error_from_json() {
    let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error: PayArcError = json_error.into();
    assert!(error.to_string().starts_with("JSON error"));
}

#[test]
fn test_error_from_io() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: PayArcError = io_error.into();
    assert!(matches!(error, PayArcError::Io(_)));
    assert!(error.to_string().contains("missing"));
}
