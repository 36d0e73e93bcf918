mod nested;

use super::*;
use serde::Serialize;

use core::fmt::Debug;

/*
Python code to split output from remix into chunks of 32 bytes, the annotations
are done manually.
```python
s = "..."
print(*(s[i:i+64] for i in range(0, len(s), 64)), sep="\n")
```
*/

struct AssertWriter<'a, I>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    expected_iter: I,
}

struct Slot<'a>(&'a [u8]);

impl<'a> Debug for Slot<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl<'a> PartialEq for Slot<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'a, I> Writer for AssertWriter<'a, I>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    fn write(&mut self, slot: &[u8]) {
        match self.expected_iter.next() {
            Some((expected, line)) => {
                assert_eq!(
                    expected.len(),
                    64,
                    "The expected input must be grouped into slots of 32 bytes as hex, without 0x."
                );
                assert_eq!(slot.len(), 32, "Each slot should have 32 bytes.");

                let expected = hex::decode(expected).unwrap();
                assert_eq!(
                    Slot(slot),
                    Slot(expected.as_slice()),
                    "slot did not match the expected value: {}",
                    line.trim()
                );
            }
            None => {
                panic!("Expected end of data, got {:?}", Slot(slot));
            }
        }
    }
}

// Iterate over the expected content, extracting the slot information (32-byte
// hex string at the beginning, skipping empty lines). Anything after the slot
// is a comment.
fn expected_iter(expected: &str) -> impl Iterator<Item = (&str, &str)> {
    expected
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let trimmed = line.trim();
            assert!(
                trimmed.len() >= 64,
                "expected line is too short, it must start with a 32 byte hex string!"
            );
            (&trimmed[..64], line)
        })
}

pub fn serialize_and_compare_fnargs<T>(value: &T, expected: &str)
where
    T: Serialize,
{
    let mut writer = AssertWriter {
        expected_iter: expected_iter(expected),
    };
    ser::to_fnargs_writer(value, &mut writer).unwrap();

    let next = writer.expected_iter.next();
    assert_eq!(next, None, "there are less slots than expected.");
}

pub fn serialize_and_compare<T>(value: &T, expected: &str)
where
    T: Serialize,
{
    let mut writer = AssertWriter {
        expected_iter: expected_iter(expected),
    };
    to_writer(value, &mut writer).unwrap();

    let next = writer.expected_iter.next();
    assert_eq!(next, None, "there are less slots than expected.");
}
