use avltree::AvlTree;

fn main() {
    let mut tree = AvlTree::new();
    for value in [3, 0, 1, 2, 4, 5, 6, 7, 8, 9] {
        tree.insert(value);
    }
    tree.insert(4);
    assert_eq!(tree.find(&1), Some(&1));
    assert_eq!(tree.remove(&1), Some(1));
    assert!(tree.find(&1).is_none());

    println!("in-order:    {:?}", tree.in_order());
    println!("pre-order:   {:?}", tree.pre_order());
    println!("post-order:  {:?}", tree.post_order());
    println!("level-order: {:?}", tree.level_order());
    println!("height: {}, len: {}", tree.height(), tree.len());

    print!("{}", tree.dump());
}
