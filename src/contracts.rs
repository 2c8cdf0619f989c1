use alloy::sol;

sol! {
    // Surface of the accelerating distributor the audit consumes: the stake
    // event that defines account membership, and the reward view read on
    // both sides of the pivot block.
    #[sol(rpc)]
    contract AcceleratingDistributor {
        event Stake(
            address indexed token,
            address indexed user,
            uint256 amount,
            uint256 averageDepositTime,
            uint256 cumulativeBalance,
            uint256 tokenCumulativeStaked
        );

        function getOutstandingRewards(
            address stakedToken,
            address account
        ) external view returns (uint256);
    }
}
