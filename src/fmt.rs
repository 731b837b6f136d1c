//! Formatting implementation for the RadixTable

use std::fmt::{Debug, Formatter, Result};

use crate::node::{NodeIx, Slot};
use crate::table::RadixTable;

impl Debug for RadixTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        DebugNode(self, self.top).fmt(f)
    }
}

struct DebugNode<'a>(&'a RadixTable, NodeIx);

impl Debug for DebugNode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let table = self.0;
        match &table.store.slots[self.1] {
            Slot::Branch(b) => f
                .debug_map()
                .entry(
                    &format_args!("bit {}", b.bit),
                    &(DebugNode(table, b.left), DebugNode(table, b.right)),
                )
                .finish(),
            Slot::Leaf(_) => DebugLeaf(table, self.1).fmt(f),
            Slot::Vacant => f.write_str("<vacant>"),
        }
    }
}

struct DebugLeaf<'a>(&'a RadixTable, NodeIx);

impl Debug for DebugLeaf<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let table = self.0;
        let leaf = table.store.leaf(self.1);
        if leaf.root {
            write!(f, "<root>")?;
        } else {
            for (i, byte) in leaf.key.as_bytes().iter().enumerate() {
                if i > 0 {
                    write!(f, ":")?;
                }
                write!(f, "{byte:02x}")?;
            }
            match leaf.mask {
                Some(m) => write!(f, "#{}", -1 - table.runtime.borrow().masks.info(m).bit)?,
                None => write!(f, "#host")?,
            }
        }
        if let Some(next) = leaf.dup_next {
            write!(f, " => ")?;
            DebugLeaf(table, next).fmt(f)?;
        }
        Ok(())
    }
}
