#[cfg(test)]
pub mod common;

#[cfg(test)]
mod test_hook_order;



#[cfg(test)]
mod test_turn_order;




#[cfg(test)]
mod test_submission;

#[cfg(test)]
mod test_rule_faults;
