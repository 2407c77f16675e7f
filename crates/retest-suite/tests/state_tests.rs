//! General state tests filled and executed against a scripted client

use retest_document::Document;
use retest_rpc::{ClientConfig, MockConnector, MockTransport, SessionRegistry};
use retest_suite::{Options, StateTestSuite, SuiteRunner, INFO_KEY};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const ROOT_HASH: &str = "0x6a5b7a47c7e8b2c1a5f0a0b3e4d2f1c0b9a8e7d6c5b4a3f2e1d0c9b8a7f6e5d4";
const CONTRACT: &str = "0x095e7baea6a6c7c4c2dfeb977efac326af552d87";

fn filler(expected_slot: &str) -> String {
    format!(
        r#"{{
  "add11": {{
    "//": "adds one and one",
    "env": {{
      "currentCoinbase": "0x2ADC25665018AA1FE0E6BC666DAC8FC2697FF9BA",
      "currentDifficulty": "0x020000",
      "currentGasLimit": "0xff112233445566",
      "currentNumber": "1",
      "currentTimestamp": "1000",
      "previousHash": "0x5e20a0453cecd065ea59c37ac63e079ee08998b6045136a8ce6635c7912ec0b6"
    }},
    "pre": {{
      "{contract}": {{
        "balance": "1000000000000000000",
        "code": "0x600160010160005500",
        "nonce": "0",
        "storage": {{}}
      }}
    }},
    "transaction": {{ "txbytes": "0xf85f800a8255f094095e7baea6a6c7c4c2dfeb977efac326af552d870a801b" }},
    "expect": [
      {{ "result": {{ "{contract}": {{ "storage": {{ "0x00": "{slot}" }} }} }} }}
    ]
  }}
}}"#,
        contract = CONTRACT,
        slot = expected_slot
    )
}

fn mock_client(state_root: &str) -> MockTransport {
    let mock = MockTransport::new();
    mock.set_response("eth_blockNumber", json!("0x01"));
    mock.set_response(
        "eth_getBlockByNumber",
        json!({"number": "0x01", "stateRoot": state_root, "transactions": [{"hash": "0x01"}]}),
    );
    mock.set_response(
        "debug_accountRangeAt",
        json!({"addressMap": {"0x11": CONTRACT}, "nextKey": "0x00"}),
    );
    mock.set_response("eth_getBalance", json!("0xde0b6b3a7640000"));
    mock.set_response("eth_getTransactionCount", json!("0x1"));
    mock.set_response("eth_getCode", json!("0x600160010160005500"));
    mock.set_response(
        "debug_storageRangeAt",
        json!({"storage": {"0xaa": {"key": "0x0", "value": "0x2"}}}),
    );
    mock
}

fn runner(root: &Path, mock: &MockTransport, filltests: bool) -> SuiteRunner<StateTestSuite> {
    let options = Options {
        filltests,
        ..Options::default()
    };
    SuiteRunner::new(
        StateTestSuite,
        root,
        options,
        Arc::new(SessionRegistry::new(MockConnector::new(mock.clone()))),
        vec![ClientConfig::default()],
    )
}

fn write_filler(root: &Path, content: &str) {
    let dir = root.join("src/GeneralStateTestsFiller/stExample");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("add11Filler.json"), content).unwrap();
}

fn compiled_path(root: &Path) -> std::path::PathBuf {
    root.join("GeneralStateTests/stExample/add11.json")
}

#[test]
fn fill_then_execute() {
    let dir = tempdir().unwrap();
    write_filler(dir.path(), &filler("0x02"));
    let mock = mock_client(ROOT_HASH);

    let fill = runner(dir.path(), &mock, true);
    fill.run_all_tests_in_folder("stExample").unwrap();
    let stats = fill.report().stats();
    assert_eq!((stats.total, stats.passed, stats.failed), (1, 1, 0), "{:?}", stats.failures);

    let written = Document::parse(&fs::read_to_string(compiled_path(dir.path())).unwrap()).unwrap();
    let test = written.get("add11").unwrap();
    let keys: Vec<_> = test.keys().unwrap().collect();
    assert_eq!(keys, vec![INFO_KEY, "env", "pre", "transaction", "post"]);
    assert_eq!(
        test.get("env").unwrap().get("currentCoinbase").unwrap().as_str().unwrap(),
        "0x2adc25665018aa1fe0e6bc666dac8fc2697ff9ba"
    );
    assert_eq!(
        test.get("env").unwrap().get("currentTimestamp").unwrap().as_str().unwrap(),
        "0x03e8"
    );
    let post = test.get("post").unwrap();
    assert_eq!(post.get("hash").unwrap().as_str().unwrap(), ROOT_HASH);
    assert_eq!(
        post.get("logs").unwrap().as_str().unwrap(),
        "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"
    );
    let balance = test
        .get("pre")
        .unwrap()
        .get(CONTRACT)
        .unwrap()
        .get("balance")
        .unwrap()
        .as_str()
        .unwrap();
    assert_eq!(balance, "0x0de0b6b3a7640000");

    let calls = mock.calls();
    let (_, params) = calls
        .iter()
        .find(|(method, _)| method == "test_setChainParams")
        .unwrap();
    assert_eq!(params[0]["sealEngine"], json!("NoProof"));
    assert_eq!(
        params[0]["genesis"]["author"],
        json!("0x2adc25665018aa1fe0e6bc666dac8fc2697ff9ba")
    );
    assert!(params[0]["accounts"].get(CONTRACT).is_some());

    let methods: Vec<&str> = calls
        .iter()
        .map(|(method, _)| method.as_str())
        .filter(|method| method.starts_with("test_") || *method == "eth_sendRawTransaction")
        .collect();
    assert_eq!(
        methods,
        vec![
            "test_setChainParams",
            "test_modifyTimestamp",
            "eth_sendRawTransaction",
            "test_mineBlocks",
            "test_getLogHash",
            "test_rewindToBlock"
        ]
    );
    let (_, timestamp) = calls
        .iter()
        .find(|(method, _)| method == "test_modifyTimestamp")
        .unwrap();
    assert_eq!(timestamp[0], json!(1000));

    let execute = runner(dir.path(), &mock, false);
    execute.run_all_tests_in_folder("stExample").unwrap();
    assert!(!execute.report().has_failures(), "{:?}", execute.report().stats().failures);
}

#[test]
fn execute_detects_different_state_root() {
    let dir = tempdir().unwrap();
    write_filler(dir.path(), &filler("0x02"));
    let fill_mock = mock_client(ROOT_HASH);
    runner(dir.path(), &fill_mock, true)
        .run_all_tests_in_folder("stExample")
        .unwrap();

    let other_root = "0x00000000000000000000000000000000000000000000000000000000000000ff";
    let execute = runner(dir.path(), &mock_client(other_root), false);
    execute.run_all_tests_in_folder("stExample").unwrap();

    let stats = execute.report().stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.failures[0].0, "add11Filler.json::add11");
    assert!(stats.failures[0].1.contains("Mismatch"));
}

#[test]
fn failed_expectation_is_not_written() {
    let dir = tempdir().unwrap();
    write_filler(dir.path(), &filler("0x03"));
    let mock = mock_client(ROOT_HASH);

    let fill = runner(dir.path(), &mock, true);
    fill.run_all_tests_in_folder("stExample").unwrap();

    let stats = fill.report().stats();
    assert_eq!((stats.total, stats.failed), (1, 1));
    assert!(stats.failures[0].1.contains("Comparison failed"));
    assert!(!compiled_path(dir.path()).exists());
}

#[test]
fn rejected_chain_params_fail_the_test() {
    let dir = tempdir().unwrap();
    write_filler(dir.path(), &filler("0x02"));
    let mock = mock_client(ROOT_HASH);
    mock.set_response("test_setChainParams", json!(false));

    let fill = runner(dir.path(), &mock, true);
    fill.run_all_tests_in_folder("stExample").unwrap();

    let stats = fill.report().stats();
    assert_eq!(stats.failed, 1);
    assert!(stats.failures[0].1.contains("test_setChainParams"));
    assert_eq!(mock.call_count("eth_sendRawTransaction"), 0);
}
