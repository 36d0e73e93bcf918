use super::*;
use types::{Address, Hash, U256};

#[test]
fn bytes_in_struct() {
    /*
    ```solidity
        struct BytesContainerData {
            bytes a;
        }
        function BytesContainer() public pure returns(bytes memory) {
            BytesContainerData memory d;
            d.a = "\xa1\xa2\xa3\xa4";
            return abi.encode(d);
        }
    ```
    */
    #[derive(Serialize, Debug)]
    struct BytesContainer {
        #[serde(with = "as_bytes")]
        a: Vec<u8>,
    }

    let d = BytesContainer {
        a: vec![0xa1, 0xa2, 0xa3, 0xa4],
    };

    let expected = "
0000000000000000000000000000000000000000000000000000000000000020 // d offset
    0000000000000000000000000000000000000000000000000000000000000020 // d.a offset
        0000000000000000000000000000000000000000000000000000000000000004 // d.a length
        a1a2a3a400000000000000000000000000000000000000000000000000000000 // d.a
    ";
    serialize_and_compare(&d, expected);
}

#[test]
fn bytes_longer_than_one_slot() {
    #[derive(Serialize, Debug)]
    struct Data(#[serde(with = "as_bytes")] Vec<u8>);

    let d = Data((1..=33).collect());

    let expected = "
0000000000000000000000000000000000000000000000000000000000000020 // d offset
    0000000000000000000000000000000000000000000000000000000000000020 // d.0 offset
        0000000000000000000000000000000000000000000000000000000000000021 // length
        0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20
        2100000000000000000000000000000000000000000000000000000000000000
    ";
    serialize_and_compare(&d, expected);
}

// Layout of a state struct with a nested outcome that contains dynamic arrays
// of static structs and of dynamic arrays.
#[derive(Serialize, Debug)]
struct Asset {
    chain_id: U256,
    holder: Address,
}

#[derive(Serialize, Debug)]
struct Allocation {
    assets: Vec<Asset>,
    balances: Vec<Vec<U256>>,
    locked: Vec<U256>,
}

#[derive(Serialize, Debug)]
struct State {
    id: Hash,
    version: u64,
    outcome: Allocation,
    #[serde(with = "as_bytes")]
    app_data: Vec<u8>,
    is_final: bool,
}

/* Solidity: get_state_1A2P()
```solidity
function get_state_1A2P() internal pure returns(Channel.State memory) {
    Channel.State memory s;
    s.channelID = "1111";
    s.version = 0x2222;
    s.outcome.assets = new Channel.Asset[](1);
    s.outcome.assets[0].chainID = 0x3333;
    s.outcome.assets[0].holder = 0x5B38Da6a701c568545dCfcB03FcB875f56beddC4;
    s.outcome.balances = new uint256[][](1); // 1 Asset, 2 Participants
    s.outcome.balances[0] = new uint256[](2);
    s.outcome.balances[0][0] = 0x5555;
    s.outcome.balances[0][1] = 0x6666;
    s.appData = "";
    s.isFinal = true;
    return s;
}
```
*/
fn state_1a2p() -> State {
    let mut holder = Address::default();
    holder
        .0
        .copy_from_slice(&hex::decode("5B38Da6a701c568545dCfcB03FcB875f56beddC4").unwrap());
    let mut id = Hash::default();
    id.0[..4].copy_from_slice(b"1111");

    State {
        id,
        version: 0x2222,
        outcome: Allocation {
            assets: vec![Asset {
                chain_id: 0x3333.into(),
                holder,
            }],
            balances: vec![vec![0x5555.into(), 0x6666.into()]],
            locked: vec![],
        },
        app_data: vec![],
        is_final: true,
    }
}

#[test]
fn state_1a2p_encode() {
    let expected = "
0000000000000000000000000000000000000000000000000000000000000020 // state offset
3131313100000000000000000000000000000000000000000000000000000000 // id
0000000000000000000000000000000000000000000000000000000000002222 // version
00000000000000000000000000000000000000000000000000000000000000a0 // outcome offset
0000000000000000000000000000000000000000000000000000000000000220 // app_data offset
0000000000000000000000000000000000000000000000000000000000000001 // is_final
    0000000000000000000000000000000000000000000000000000000000000060 // assets offset
    00000000000000000000000000000000000000000000000000000000000000c0 // balances offset
    0000000000000000000000000000000000000000000000000000000000000160 // locked offset
        0000000000000000000000000000000000000000000000000000000000000001 // assets length
        0000000000000000000000000000000000000000000000000000000000003333 // assets[0].chain_id
        0000000000000000000000005b38da6a701c568545dcfcb03fcb875f56beddc4 // assets[0].holder
        0000000000000000000000000000000000000000000000000000000000000001 // balances length
        0000000000000000000000000000000000000000000000000000000000000020 // balances[0] offset
        0000000000000000000000000000000000000000000000000000000000000002 // balances[0] length
        0000000000000000000000000000000000000000000000000000000000005555
        0000000000000000000000000000000000000000000000000000000000006666
        0000000000000000000000000000000000000000000000000000000000000000 // locked length
    0000000000000000000000000000000000000000000000000000000000000000 // app_data length
    ";

    serialize_and_compare(&state_1a2p(), expected)
}

#[test]
fn state_1a2p_hash() {
    let hash = to_hash(&state_1a2p()).unwrap();
    assert_eq!(
        hex::encode(hash.0),
        "e7518ad2414d38370ea5f21f1351eabce47480ab191c984ac12a3aedf70eda3d"
    );
}

#[test]
fn vec_writer_matches_hash_writer() {
    let state = state_1a2p();
    let buf = ser::to_vec(&state).unwrap();
    assert_eq!(buf.len(), 19 * 32);
    assert_eq!(hashing::keccak256(&buf), to_hash(&state).unwrap());
}
